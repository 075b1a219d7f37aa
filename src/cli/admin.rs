use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tracing::info;

use crate::admin::form::{FieldKind, Form};
use crate::admin::{EntityModal, ModalEntity, ModalKey};
use crate::fmt::number;
use crate::models::{Account, Company, User};
use crate::notify::Notifier;
use crate::tui::{BORDER_STYLE, FOCUS_STYLE, FOOTER_STYLE, TITLE_STYLE};

/// How a record is shown in an admin list.
pub trait AdminRow: ModalEntity {
    const PLURAL: &'static str;
    const HEADERS: &'static [(&'static str, usize)];

    fn cells(&self) -> Vec<String>;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

impl AdminRow for Account {
    const PLURAL: &'static str = "Plano de Contas";
    const HEADERS: &'static [(&'static str, usize)] =
        &[("Código", 10), ("Nome", 32), ("Tipo", 10), ("Grupo", 24)];

    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.kind.label().to_string(),
            self.group.clone(),
        ]
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl AdminRow for Company {
    const PLURAL: &'static str = "Empresas";
    const HEADERS: &'static [(&'static str, usize)] =
        &[("Razão social", 30), ("Nome fantasia", 22), ("CNPJ", 20), ("E-mail", 30)];

    fn cells(&self) -> Vec<String> {
        vec![
            self.legal_name.clone(),
            self.trade_name.clone(),
            self.cnpj.clone(),
            self.email.clone(),
        ]
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl AdminRow for User {
    const PLURAL: &'static str = "Usuários";
    const HEADERS: &'static [(&'static str, usize)] =
        &[("Nome", 24), ("E-mail", 34), ("Perfil", 14)];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.role.label().to_string(),
        ]
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

enum Screen {
    List,
    ConfirmDelete,
}

/// List screen with add/edit/delete/toggle over an in-memory collection.
pub struct EntityManager<E: AdminRow> {
    items: Vec<E>,
    selection: usize,
    screen: Screen,
    modal: EntityModal<E>,
    /// Index being edited; `None` while creating.
    editing: Option<usize>,
}

impl<E: AdminRow> EntityManager<E> {
    pub fn new(items: Vec<E>) -> Self {
        Self {
            items,
            selection: 0,
            screen: Screen::List,
            modal: EntityModal::default(),
            editing: None,
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// True while a modal or confirmation holds the keyboard.
    pub fn captures_input(&self) -> bool {
        self.modal.is_open() || matches!(self.screen, Screen::ConfirmDelete)
    }

    fn clamp_selection(&mut self) {
        self.selection = self.selection.min(self.items.len().saturating_sub(1));
    }

    pub fn handle_key(&mut self, code: KeyCode, notifier: &mut Notifier) {
        if self.modal.is_open() {
            self.handle_modal_key(code, notifier);
            return;
        }
        match self.screen {
            Screen::List => self.handle_list_key(code, notifier),
            Screen::ConfirmDelete => self.handle_delete_key(code, notifier),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode, notifier: &mut Notifier) {
        match code {
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                if !self.items.is_empty() {
                    self.selection = (self.selection + 1).min(self.items.len() - 1);
                }
            }
            KeyCode::Char('a') => {
                self.editing = None;
                self.modal.open(None);
            }
            KeyCode::Enter => {
                if let Some(item) = self.items.get(self.selection) {
                    self.editing = Some(self.selection);
                    self.modal.open(Some(item.clone()));
                }
            }
            KeyCode::Char('d') => {
                if !self.items.is_empty() {
                    self.screen = Screen::ConfirmDelete;
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('t') => {
                if let Some(item) = self.items.get_mut(self.selection) {
                    let active = !item.is_active();
                    item.set_active(active);
                    let state = if active { "ativado" } else { "desativado" };
                    info!(entity = E::NAME, title = %item.title(), active, "status toggled");
                    notifier.info(format!("{} {state}", item.title()));
                }
            }
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, code: KeyCode, notifier: &mut Notifier) {
        match self.modal.handle_key(code) {
            ModalKey::Continue => {}
            ModalKey::Close => {
                self.modal.close();
                self.editing = None;
            }
            ModalKey::Save => {
                let items = &mut self.items;
                let editing = self.editing;
                let mut saved_at = None;
                self.modal.handle_save(notifier, |entity| match editing {
                    Some(idx) if idx < items.len() => {
                        items[idx] = entity;
                        saved_at = Some(idx);
                    }
                    _ => {
                        items.push(entity);
                        saved_at = Some(items.len() - 1);
                    }
                });
                if let Some(idx) = saved_at {
                    self.selection = idx;
                    self.editing = None;
                }
            }
        }
    }

    fn handle_delete_key(&mut self, code: KeyCode, notifier: &mut Notifier) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('s') => {
                if self.selection < self.items.len() {
                    let removed = self.items.remove(self.selection);
                    info!(entity = E::NAME, title = %removed.title(), "deleted");
                    notifier.success(format!("Excluído: {}", removed.title()));
                    self.clamp_selection();
                }
                self.screen = Screen::List;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::List,
            _ => {}
        }
    }

    pub fn hints(&self) -> &'static str {
        if self.modal.is_open() {
            " Tab=próximo campo  ←/→=alterar  Enter=salvar  Esc=cancelar"
        } else if let Screen::ConfirmDelete = self.screen {
            " s=confirmar  n=cancelar"
        } else {
            " a=adicionar  Enter=editar  d=excluir  Espaço=ativar/desativar"
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!(" {}", E::PLURAL), TITLE_STYLE),
                Span::styled(format!("  ({})", number(self.items.len() as i64)), FOOTER_STYLE),
            ]),
            Line::from(""),
        ];

        if self.items.is_empty() {
            lines.push(Line::from("   Nenhum registro. Pressione 'a' para adicionar."));
        } else {
            let mut header = String::from("   ");
            for (label, width) in E::HEADERS {
                header.push_str(&format!("{:<width$} ", label, width = *width));
            }
            header.push_str("Status");
            lines.push(Line::from(Span::styled(
                header,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            )));

            for (i, item) in self.items.iter().enumerate() {
                let marker = if i == self.selection { " > " } else { "   " };
                let style = if i == self.selection {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let mut row = String::from(marker);
                for ((_, width), cell) in E::HEADERS.iter().zip(item.cells()) {
                    row.push_str(&format!("{:<width$} ", truncate(&cell, *width), width = *width));
                }
                let (status, status_style) = if item.is_active() {
                    ("Ativo", Style::default().fg(Color::Rgb(80, 220, 100)))
                } else {
                    ("Inativo", FOOTER_STYLE)
                };
                lines.push(Line::from(vec![
                    Span::styled(row, style),
                    Span::styled(status, status_style),
                ]));
            }
        }

        if let Screen::ConfirmDelete = self.screen {
            if let Some(item) = self.items.get(self.selection) {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("   Excluir '{}'? (s/n)", item.title()),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        frame.render_widget(Paragraph::new(lines), area);

        if self.modal.is_open() {
            draw_modal(frame, area, &self.modal.title(), self.modal.form());
        }
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

/// Centered box of `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn form_lines(form: &Form) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let is_focused = i == form.focused;
        let label_style = if is_focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style = if is_focused { FOCUS_STYLE } else { Style::default() };
        let value = match &field.kind {
            FieldKind::Text => {
                let cursor = if is_focused { "_" } else { "" };
                format!("{}{cursor}", field.value)
            }
            FieldKind::Selector { .. } | FieldKind::Toggle { .. } => {
                let arrows = if is_focused { ("< ", " >") } else { ("  ", "  ") };
                format!("{}{}{}", arrows.0, field.value, arrows.1)
            }
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<14} ", field.label), label_style),
            Span::styled(value, value_style),
        ]));
    }
    lines
}

fn draw_modal(frame: &mut Frame, area: Rect, title: &str, form: &Form) {
    let height = form.fields.len() as u16 + 4;
    let rect = centered(area, 64, height);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(BORDER_STYLE)
        .title(Span::styled(format!(" {title} "), TITLE_STYLE));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(form_lines(form)).block(block), rect);
}
