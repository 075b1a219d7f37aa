use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    DefaultTerminal, Frame,
};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::admin::{centered, EntityManager};
use crate::cli::charts::{
    draw_expenses, draw_metric_cards, draw_monthly_bars, draw_waterfall, insight_lines,
    metric_cards_height, result_lines, statement_lines, trend_lines,
};
use crate::cli::export::{default_path, write_document};
use crate::data;
use crate::error::{DreError, Result};
use crate::export::{ExportFormat, ExportOptions, ExportOutcome, ExportRequest, ExportService};
use crate::filters::{Currency, FilterPatch, FilterStore, Filters, Precision, RefreshOutcome};
use crate::models::{Account, Company, Insight, User};
use crate::notify::Notifier;
use crate::period::{MonthToken, PeriodConfig, PeriodMode, PeriodSelector, Periodo};
use crate::reports::{self, ExpenseSlice, MetricCard, MonthlyBar, Statement, TrendItem, Waterfall};
use crate::responsive::{ResizeBus, ResizeSubscription, Responsive, Viewport};
use crate::settings::Settings;
use crate::tui::{
    install_panic_hook, separator, BORDER_STYLE, FOCUS_STYLE, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE, TITLE_STYLE, WARNING_STYLE,
};

const TICK: Duration = Duration::from_millis(100);
const SIDEBAR_WIDTH: u16 = 20;
const GLOBAL_HINTS: &str = "f=filtros  r=atualizar  e=exportar  c=cancelar  Tab=página  q=sair";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Overview,
    Statement,
    Trends,
    Insights,
    Accounts,
    Companies,
    Users,
    Export,
}

impl Page {
    const ALL: [Page; 8] = [
        Page::Overview,
        Page::Statement,
        Page::Trends,
        Page::Insights,
        Page::Accounts,
        Page::Companies,
        Page::Users,
        Page::Export,
    ];

    fn label(&self) -> &'static str {
        match self {
            Page::Overview => "Visão Geral",
            Page::Statement => "Demonstrativo",
            Page::Trends => "Tendências",
            Page::Insights => "Insights",
            Page::Accounts => "Contas",
            Page::Companies => "Empresas",
            Page::Users => "Usuários",
            Page::Export => "Exportar",
        }
    }

    fn index(&self) -> usize {
        Page::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    fn offset(&self, step: isize) -> Page {
        let len = Page::ALL.len() as isize;
        let idx = (self.index() as isize + step).rem_euclid(len);
        Page::ALL[idx as usize]
    }
}

// ---------------------------------------------------------------------------
// Cached view models
// ---------------------------------------------------------------------------

/// Everything the report pages render, rebuilt when the filters change.
struct ViewData {
    filters: Filters,
    metrics: Vec<MetricCard>,
    statement: Statement,
    waterfall: Waterfall,
    expenses: Vec<ExpenseSlice>,
    bars: Vec<MonthlyBar>,
    trends: Vec<TrendItem>,
}

impl ViewData {
    fn build(filters: Filters) -> Self {
        Self {
            metrics: reports::get_metrics(&filters),
            statement: reports::get_statement(&filters),
            waterfall: reports::get_waterfall(&filters),
            expenses: reports::get_expense_breakdown(&filters),
            bars: reports::get_monthly_series(&filters),
            trends: reports::get_trends(&filters),
            filters,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelField {
    Mode,
    Month,
    Start,
    End,
    Currency,
    Precision,
}

enum PanelKey {
    Continue,
    Apply(FilterPatch),
    Cancel,
}

/// Draft of period, currency and precision; nothing reaches the store until Enter.
struct FilterPanel {
    selector: PeriodSelector,
    moeda: Currency,
    precisao: Precision,
    cursor: usize,
}

fn step_month(month: MonthToken, forward: bool) -> MonthToken {
    let next = if forward { month.next() } else { month.prev() };
    next.unwrap_or(month)
}

impl FilterPanel {
    /// Reuse the remembered selector while it still matches the applied period,
    /// so bounds from the inactive mode survive between openings.
    fn new(filters: &Filters, remembered: &PeriodSelector) -> Self {
        let period = filters.period();
        let selector = if remembered.config() == period {
            remembered.clone()
        } else {
            PeriodSelector::new(period)
        };
        Self {
            selector,
            moeda: filters.moeda,
            precisao: filters.precisao,
            cursor: 0,
        }
    }

    fn fields(&self) -> Vec<PanelField> {
        match self.selector.mode() {
            PeriodMode::Month => vec![
                PanelField::Mode,
                PanelField::Month,
                PanelField::Currency,
                PanelField::Precision,
            ],
            PeriodMode::Range => vec![
                PanelField::Mode,
                PanelField::Start,
                PanelField::End,
                PanelField::Currency,
                PanelField::Precision,
            ],
        }
    }

    fn focused(&self) -> PanelField {
        let fields = self.fields();
        fields[self.cursor.min(fields.len() - 1)]
    }

    fn change(&mut self, forward: bool) {
        match (self.focused(), self.selector.config()) {
            (PanelField::Mode, _) => {
                self.selector.toggle_mode();
            }
            (PanelField::Month, PeriodConfig::Month { month }) => {
                self.selector.set_month(step_month(month, forward));
            }
            (PanelField::Start, PeriodConfig::Range { start_month, .. }) => {
                self.selector.set_start_month(step_month(start_month, forward));
            }
            (PanelField::End, PeriodConfig::Range { end_month, .. }) => {
                self.selector.set_end_month(step_month(end_month, forward));
            }
            (PanelField::Currency, _) => {
                let len = Currency::ALL.len();
                let idx = Currency::ALL.iter().position(|c| *c == self.moeda).unwrap_or(0);
                let idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
                self.moeda = Currency::ALL[idx];
            }
            (PanelField::Precision, _) => {
                self.precisao = if forward {
                    self.precisao.next()
                } else {
                    self.precisao.next().next()
                };
            }
            _ => {}
        }
        self.cursor = self.cursor.min(self.fields().len() - 1);
    }

    /// Jump the focused month field to a calendar bound.
    fn jump(&mut self, month: MonthToken) {
        match self.focused() {
            PanelField::Month => {
                self.selector.set_month(month);
            }
            PanelField::Start => {
                self.selector.set_start_month(month);
            }
            PanelField::End => {
                self.selector.set_end_month(month);
            }
            _ => {}
        }
    }

    fn patch(&self) -> FilterPatch {
        FilterPatch {
            periodo: Some(Periodo::Config(self.selector.config())),
            moeda: Some(self.moeda),
            precisao: Some(self.precisao),
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> PanelKey {
        match code {
            KeyCode::Esc => return PanelKey::Cancel,
            KeyCode::Enter => return PanelKey::Apply(self.patch()),
            KeyCode::Up | KeyCode::BackTab => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => {
                self.cursor = (self.cursor + 1).min(self.fields().len() - 1);
            }
            KeyCode::Left => self.change(false),
            KeyCode::Right | KeyCode::Char(' ') => self.change(true),
            KeyCode::Home => self.jump(MonthToken::first()),
            KeyCode::End => self.jump(MonthToken::last()),
            _ => {}
        }
        PanelKey::Continue
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let config = self.selector.config();
        let mut lines = vec![Line::from("")];
        for (i, field) in self.fields().into_iter().enumerate() {
            let (label, value) = match (field, config) {
                (PanelField::Mode, PeriodConfig::Month { .. }) => ("Modo", "Mês".to_string()),
                (PanelField::Mode, PeriodConfig::Range { .. }) => ("Modo", "Intervalo".to_string()),
                (PanelField::Month, _) => ("Mês", config.anchor().label()),
                (PanelField::Start, PeriodConfig::Range { start_month, .. }) => {
                    ("Início", start_month.label())
                }
                (PanelField::End, PeriodConfig::Range { end_month, .. }) => ("Fim", end_month.label()),
                (PanelField::Currency, _) => ("Moeda", self.moeda.code().to_string()),
                (PanelField::Precision, _) => ("Precisão", format!("{} casas", self.precisao)),
                _ => continue,
            };
            let style = if i == self.cursor { SELECTED_STYLE } else { Style::default() };
            lines.push(Line::from(vec![
                Span::styled(format!(" {label:<10}"), FOOTER_STYLE),
                Span::styled(format!("< {value} >"), style),
            ]));
        }
        if config.is_inverted() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " Início depois do fim: nenhum mês no período.",
                WARNING_STYLE,
            )));
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// Export page
// ---------------------------------------------------------------------------

const EXPORT_SECTIONS: [&str; 5] = [
    "Resumo",
    "Demonstrativo de Resultado",
    "Cascata do Resultado",
    "Composição das Despesas",
    "Insights",
];

struct ExportPanel {
    format: ExportFormat,
    options: ExportOptions,
    /// Row 0 is the format; rows 1..=5 are the sections.
    cursor: usize,
}

impl ExportPanel {
    fn new() -> Self {
        Self {
            format: ExportFormat::Text,
            options: ExportOptions::default(),
            cursor: 0,
        }
    }

    fn section_flag(&mut self, idx: usize) -> Option<&mut bool> {
        match idx {
            0 => Some(&mut self.options.include_summary),
            1 => Some(&mut self.options.include_statement),
            2 => Some(&mut self.options.include_waterfall),
            3 => Some(&mut self.options.include_expenses),
            4 => Some(&mut self.options.include_insights),
            _ => None,
        }
    }

    fn section_on(&self, idx: usize) -> bool {
        match idx {
            0 => self.options.include_summary,
            1 => self.options.include_statement,
            2 => self.options.include_waterfall,
            3 => self.options.include_expenses,
            _ => self.options.include_insights,
        }
    }

    fn cycle_format(&mut self, forward: bool) {
        let len = ExportFormat::ALL.len();
        let idx = ExportFormat::ALL.iter().position(|f| *f == self.format).unwrap_or(0);
        let idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.format = ExportFormat::ALL[idx];
    }

    /// Returns true when Enter asks for an export.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(EXPORT_SECTIONS.len()),
            KeyCode::Left if self.cursor == 0 => self.cycle_format(false),
            KeyCode::Right if self.cursor == 0 => self.cycle_format(true),
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                if self.cursor == 0 {
                    self.cycle_format(true);
                } else if let Some(flag) = self.section_flag(self.cursor - 1) {
                    *flag = !*flag;
                }
            }
            KeyCode::Enter => return true,
            _ => {}
        }
        false
    }

    fn lines(&self, exporting: bool, last_export: Option<&PathBuf>) -> Vec<Line<'static>> {
        let row_style = |row: usize| {
            if row == self.cursor {
                SELECTED_STYLE
            } else {
                Style::default()
            }
        };
        let mut lines = vec![
            Line::from(Span::styled(" Exportar relatório", TITLE_STYLE)),
            Line::from(""),
            Line::from(vec![
                Span::styled(" Formato   ", FOOTER_STYLE),
                Span::styled(format!("< {} >", self.format.label()), row_style(0)),
            ]),
            Line::from(""),
        ];
        for (i, section) in EXPORT_SECTIONS.iter().enumerate() {
            let mark = if self.section_on(i) { "[x]" } else { "[ ]" };
            lines.push(Line::from(Span::styled(format!(" {mark} {section}"), row_style(i + 1))));
        }
        lines.push(Line::from(""));
        let status = if exporting {
            Span::styled(" Gerando arquivo... (c=cancelar)", FOCUS_STYLE)
        } else if let Some(path) = last_export {
            Span::styled(format!(" Último arquivo: {}", path.display()), FOOTER_STYLE)
        } else {
            Span::styled(" Enter=exportar", FOOTER_STYLE)
        };
        lines.push(Line::from(status));
        lines
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

struct Task<T> {
    handle: JoinHandle<Result<T>>,
    cancel: CancellationToken,
}

struct Dashboard {
    rt: Runtime,
    root_cancel: CancellationToken,
    store: FilterStore,
    filter_rx: watch::Receiver<Filters>,
    exporter: ExportService,
    refresh: Option<Task<RefreshOutcome>>,
    export: Option<Task<ExportOutcome>>,
    responsive: Arc<Mutex<Responsive>>,
    resize: ResizeBus,
    _resize_sub: ResizeSubscription,
    cell_px: (u16, u16),
    page: Page,
    scroll: u16,
    view: ViewData,
    insights: Vec<Insight>,
    panel: Option<FilterPanel>,
    selector: PeriodSelector,
    export_panel: ExportPanel,
    last_export: Option<PathBuf>,
    accounts: EntityManager<Account>,
    companies: EntityManager<Company>,
    users: EntityManager<User>,
    notifier: Notifier,
    company: String,
    data_dir: PathBuf,
}

impl Dashboard {
    fn new(settings: &Settings) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()?;

        let store = FilterStore::new(settings.initial_filters(), settings.refresh_delay());
        let filter_rx = store.subscribe();

        let responsive = Arc::new(Mutex::new(Responsive::new(settings.breakpoints)));
        let resize = ResizeBus::default();
        let shared = Arc::clone(&responsive);
        let resize_sub = resize.subscribe(move |viewport| {
            if let Ok(mut r) = shared.lock() {
                r.observe(viewport);
            }
        });

        Ok(Self {
            rt,
            root_cancel: CancellationToken::new(),
            view: ViewData::build(store.filters()),
            selector: PeriodSelector::new(store.filters().period()),
            store,
            filter_rx,
            exporter: ExportService::new(settings.export_delay()),
            refresh: None,
            export: None,
            responsive,
            resize,
            _resize_sub: resize_sub,
            cell_px: (settings.cell_width_px, settings.cell_height_px),
            page: Page::Overview,
            scroll: 0,
            insights: reports::get_insights(),
            panel: None,
            export_panel: ExportPanel::new(),
            last_export: None,
            accounts: EntityManager::new(data::sample_accounts()),
            companies: EntityManager::new(data::sample_companies()),
            users: EntityManager::new(data::sample_users()),
            notifier: Notifier::default(),
            company: settings.company_name.clone(),
            data_dir: settings.data_path(),
        })
    }

    fn responsive(&self) -> Responsive {
        match self.responsive.lock() {
            Ok(r) => r.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn resize(&self, cols: u16, rows: u16) {
        let viewport = Viewport::from_cells(cols, rows, self.cell_px.0, self.cell_px.1);
        debug!(
            cols,
            rows,
            width = viewport.width,
            listeners = self.resize.listener_count(),
            "viewport resized"
        );
        self.resize.emit(viewport);
    }

    /// Rebuild cached views when a filter update was published.
    fn sync_filters(&mut self) {
        if self.filter_rx.has_changed().unwrap_or(false) {
            let filters = self.filter_rx.borrow_and_update().clone();
            self.view = ViewData::build(filters);
        }
    }

    // -- async tasks -------------------------------------------------------

    fn start_refresh(&mut self) {
        if self.refresh.is_some() {
            self.notifier.error(DreError::RefreshInFlight.to_string());
            return;
        }
        let cancel = self.root_cancel.child_token();
        let store = self.store.clone();
        let token = cancel.clone();
        let handle = self.rt.spawn(async move { store.refresh_data(token).await });
        self.refresh = Some(Task { handle, cancel });
    }

    fn start_export(&mut self) {
        if self.export.is_some() {
            self.notifier.error(DreError::ExportInFlight.to_string());
            return;
        }
        if self.export_panel.options.is_empty() {
            self.notifier.error("Selecione ao menos uma seção para exportar");
            return;
        }
        let request = ExportRequest {
            format: self.export_panel.format,
            options: self.export_panel.options,
            filters: self.store.filters(),
            company: self.company.clone(),
        };
        let cancel = self.root_cancel.child_token();
        let exporter = self.exporter.clone();
        let token = cancel.clone();
        let handle = self.rt.spawn(async move { exporter.export(request, token).await });
        self.export = Some(Task { handle, cancel });
        self.notifier.info(format!("Exportando {}...", self.export_panel.format.label()));
    }

    fn cancel_tasks(&mut self) {
        let mut any = false;
        for cancel in [
            self.refresh.as_ref().map(|t| &t.cancel),
            self.export.as_ref().map(|t| &t.cancel),
        ]
        .into_iter()
        .flatten()
        {
            cancel.cancel();
            any = true;
        }
        if !any {
            self.notifier.info("Nada para cancelar");
        }
    }

    fn is_busy(&self) -> bool {
        self.refresh.is_some() || self.export.is_some()
    }

    fn poll_tasks(&mut self) {
        if self.refresh.as_ref().is_some_and(|t| t.handle.is_finished()) {
            if let Some(task) = self.refresh.take() {
                let result = self.rt.block_on(task.handle).map_err(DreError::task).and_then(|r| r);
                match result {
                    Ok(RefreshOutcome::Completed) => {
                        self.view = ViewData::build(self.store.filters());
                        self.notifier.success("Dados atualizados");
                    }
                    Ok(RefreshOutcome::Cancelled) => self.notifier.info("Atualização cancelada"),
                    Err(e) => self.notifier.error(e.to_string()),
                }
            }
        }

        if self.export.as_ref().is_some_and(|t| t.handle.is_finished()) {
            if let Some(task) = self.export.take() {
                let result = self
                    .rt
                    .block_on(task.handle)
                    .map_err(DreError::task)
                    .and_then(|r| r)
                    .and_then(|outcome| match outcome {
                        ExportOutcome::Completed(doc) => {
                            write_document(&doc, &default_path(&self.data_dir, &doc)).map(Some)
                        }
                        ExportOutcome::Cancelled => Ok(None),
                    });
                match result {
                    Ok(Some(path)) => {
                        self.notifier.success(format!("Exportado: {}", path.display()));
                        self.last_export = Some(path);
                    }
                    Ok(None) => self.notifier.info("Exportação cancelada"),
                    Err(e) => self.notifier.error(format!("Falha na exportação: {e}")),
                }
            }
        }
    }

    // -- input -------------------------------------------------------------

    fn admin_captures_input(&self) -> bool {
        match self.page {
            Page::Accounts => self.accounts.captures_input(),
            Page::Companies => self.companies.captures_input(),
            Page::Users => self.users.captures_input(),
            _ => false,
        }
    }

    fn set_page(&mut self, page: Page) {
        if page != self.page {
            debug!(page = page.label(), "page changed");
            self.page = page;
            self.scroll = 0;
        }
    }

    /// Returns true when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        self.notifier.tick();

        if let Some(panel) = self.panel.as_mut() {
            match panel.handle_key(code) {
                PanelKey::Continue => {}
                PanelKey::Cancel => self.panel = None,
                PanelKey::Apply(patch) => {
                    self.selector = panel.selector.clone();
                    self.store.update_filters(patch);
                    self.panel = None;
                    let period = self.store.filters().period();
                    info!(period = %period.label(), "filters applied");
                    if period.is_inverted() {
                        self.notifier.info("Período invertido: nenhum mês coberto");
                    }
                }
            }
            return false;
        }

        if self.admin_captures_input() {
            self.page_key(code);
            return false;
        }

        match code {
            KeyCode::Esc if self.notifier.current().is_some() => self.notifier.dismiss(),
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('f') => {
                self.panel = Some(FilterPanel::new(&self.store.filters(), &self.selector));
            }
            KeyCode::Char('r') => self.start_refresh(),
            KeyCode::Char('e') => self.start_export(),
            KeyCode::Char('c') => self.cancel_tasks(),
            KeyCode::Tab => self.set_page(self.page.offset(1)),
            KeyCode::BackTab => self.set_page(self.page.offset(-1)),
            KeyCode::Char(d @ '1'..='8') => {
                let idx = d as usize - '1' as usize;
                self.set_page(Page::ALL[idx]);
            }
            other => self.page_key(other),
        }
        false
    }

    fn page_key(&mut self, code: KeyCode) {
        match self.page {
            Page::Accounts => self.accounts.handle_key(code, &mut self.notifier),
            Page::Companies => self.companies.handle_key(code, &mut self.notifier),
            Page::Users => self.users.handle_key(code, &mut self.notifier),
            Page::Export => {
                if self.export_panel.handle_key(code) {
                    self.start_export();
                }
            }
            _ => match code {
                KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
                KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
                KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
                KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
                KeyCode::Home => self.scroll = 0,
                _ => {}
            },
        }
    }

    // -- drawing -----------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let responsive = self.responsive();
        let area = frame.area();

        let [header_area, sep_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(self.header_line()), header_area);
        frame.render_widget(
            Paragraph::new(separator(area.width)).style(BORDER_STYLE),
            sep_area,
        );

        let content_area = if responsive.should_stack_vertically() {
            let [tabs_area, content] =
                Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(body_area);
            frame.render_widget(Paragraph::new(self.tab_strip()), tabs_area);
            content
        } else {
            let [sidebar_area, content] =
                Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                    .areas(body_area);
            self.draw_sidebar(frame, sidebar_area);
            content
        };

        self.draw_page(frame, content_area, &responsive);
        frame.render_widget(Paragraph::new(self.footer_line()), footer_area);

        if let Some(panel) = &self.panel {
            let popup = centered(area, 52, 12);
            frame.render_widget(Clear, popup);
            frame.render_widget(
                Paragraph::new(panel.lines()).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(FOCUS_STYLE)
                        .title(Span::styled(" Filtros ", TITLE_STYLE)),
                ),
                popup,
            );
        }
    }

    fn header_line(&self) -> Line<'static> {
        let filters = &self.view.filters;
        let period = filters.period();
        let mut spans = vec![
            Span::styled(format!(" DRE Analytics · {}", self.company), HEADER_STYLE),
            Span::styled("  │  ", BORDER_STYLE),
            Span::raw(period.label()),
        ];
        if period.is_inverted() {
            spans.push(Span::styled(" (invertido)", WARNING_STYLE));
        }
        spans.push(Span::styled("  │  ", BORDER_STYLE));
        spans.push(Span::raw(format!(
            "{}  {} casas",
            filters.moeda.code(),
            filters.precisao
        )));
        spans.push(Span::styled("  │  ", BORDER_STYLE));
        let state = if self.store.is_refreshing() {
            Span::styled("Atualizando...", FOCUS_STYLE)
        } else if self.exporter.is_exporting() {
            Span::styled("Exportando...", FOCUS_STYLE)
        } else if let Some(at) = self.store.last_refreshed() {
            Span::styled(format!("Atualizado às {}", at.format("%H:%M:%S")), FOOTER_STYLE)
        } else {
            Span::styled("Dados de exemplo", FOOTER_STYLE)
        };
        spans.push(state);
        Line::from(spans)
    }

    fn tab_strip(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for (i, page) in Page::ALL.iter().enumerate() {
            let style = if *page == self.page { SELECTED_STYLE } else { FOOTER_STYLE };
            spans.push(Span::styled(format!(" {}:{} ", i + 1, page.label()), style));
        }
        Line::from(spans)
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from("")];
        for (i, page) in Page::ALL.iter().enumerate() {
            if i == 4 {
                lines.push(Line::from(Span::styled(" Cadastros", FOOTER_STYLE)));
            }
            let marker = if *page == self.page { "▸" } else { " " };
            let style = if *page == self.page { SELECTED_STYLE } else { Style::default() };
            lines.push(Line::from(Span::styled(
                format!("{marker} {} {}", i + 1, page.label()),
                style,
            )));
        }
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::RIGHT)
                    .border_style(BORDER_STYLE),
            ),
            area,
        );
    }

    fn footer_line(&self) -> Line<'static> {
        if let Some(n) = self.notifier.current() {
            return Line::from(Span::styled(format!(" {}", n.message), n.level.style()));
        }
        if self.panel.is_some() {
            return Line::from(Span::styled(
                " ↑↓=campo  ←→=alterar  Home/End=limites  Enter=aplicar  Esc=cancelar",
                FOOTER_STYLE,
            ));
        }
        let page_hints = match self.page {
            Page::Accounts => self.accounts.hints(),
            Page::Companies => self.companies.hints(),
            Page::Users => self.users.hints(),
            Page::Export => " ↑↓=selecionar  Espaço/←→=alterar  Enter=exportar",
            _ => " ↑↓=rolar",
        };
        if self.admin_captures_input() {
            return Line::from(Span::styled(page_hints, FOOTER_STYLE));
        }
        Line::from(Span::styled(
            format!("{page_hints}  {GLOBAL_HINTS}"),
            FOOTER_STYLE,
        ))
    }

    fn draw_page(&self, frame: &mut Frame, area: Rect, responsive: &Responsive) {
        let filters = &self.view.filters;
        match self.page {
            Page::Overview => self.draw_overview(frame, area, responsive),
            Page::Statement => {
                let lines = statement_lines(&self.view.statement, filters);
                let [top, bottom] = Layout::vertical([
                    Constraint::Length(lines.len() as u16 + 1),
                    Constraint::Fill(1),
                ])
                .areas(area);
                frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), top);
                draw_waterfall(frame, bottom, &self.view.waterfall, filters);
            }
            Page::Trends => {
                let [top, bottom] =
                    Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                        .areas(area);
                draw_monthly_bars(frame, top, &self.view.bars, filters);
                frame.render_widget(
                    Paragraph::new(trend_lines(&self.view.trends, filters)).scroll((self.scroll, 0)),
                    bottom,
                );
            }
            Page::Insights => {
                let mut lines = insight_lines(&self.insights, area.width as usize);
                lines.extend(result_lines(reports::get_results(), filters));
                frame.render_widget(
                    Paragraph::new(lines)
                        .wrap(Wrap { trim: false })
                        .scroll((self.scroll, 0)),
                    area,
                );
            }
            Page::Accounts => self.accounts.draw(frame, area),
            Page::Companies => self.companies.draw(frame, area),
            Page::Users => self.users.draw(frame, area),
            Page::Export => frame.render_widget(
                Paragraph::new(
                    self.export_panel
                        .lines(self.export.is_some(), self.last_export.as_ref()),
                ),
                area,
            ),
        }
    }

    fn draw_overview(&self, frame: &mut Frame, area: Rect, responsive: &Responsive) {
        let filters = &self.view.filters;
        let columns = responsive.columns_grid();
        let cards_height = metric_cards_height(self.view.metrics.len(), columns);

        let [cards_area, charts_area] =
            Layout::vertical([Constraint::Length(cards_height), Constraint::Fill(1)]).areas(area);
        draw_metric_cards(frame, cards_area, &self.view.metrics, filters, columns);

        if responsive.should_use_compact_layout() {
            let [waterfall_area, bars_area, expenses_area] = Layout::vertical([
                Constraint::Length(7),
                Constraint::Fill(1),
                Constraint::Length(9),
            ])
            .areas(charts_area);
            draw_waterfall(frame, waterfall_area, &self.view.waterfall, filters);
            draw_monthly_bars(frame, bars_area, &self.view.bars, filters);
            draw_expenses(frame, expenses_area, &self.view.expenses, filters);
        } else {
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(charts_area);
            let [waterfall_area, expenses_area] =
                Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).areas(left);
            draw_waterfall(frame, waterfall_area, &self.view.waterfall, filters);
            draw_expenses(frame, expenses_area, &self.view.expenses, filters);
            draw_monthly_bars(frame, right, &self.view.bars, filters);
        }
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        if let Ok((cols, rows)) = crossterm::terminal::size() {
            self.resize(cols, rows);
        }
        loop {
            self.poll_tasks();
            self.sync_filters();
            terminal.draw(|frame| self.draw(frame))?;

            if !event::poll(TICK)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                }
                Event::Resize(cols, rows) => self.resize(cols, rows),
                _ => {}
            }
        }
        Ok(())
    }

    /// Cancel outstanding work and stop the runtime.
    fn close(self) {
        if self.is_busy() {
            info!("cancelling background tasks on exit");
        }
        self.root_cancel.cancel();
        self.rt.shutdown_timeout(Duration::from_millis(500));
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(settings: &Settings) -> Result<()> {
    let mut dashboard = Dashboard::new(settings)?;
    info!(company = %settings.company_name, "dashboard started");

    install_panic_hook();
    let mut terminal = ratatui::init();
    let result = dashboard.event_loop(&mut terminal);
    ratatui::restore();

    dashboard.close();
    info!("dashboard closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLevel;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn settings(dir: &std::path::Path, refresh_ms: u64, export_ms: u64) -> Settings {
        Settings {
            data_dir: dir.to_string_lossy().to_string(),
            refresh_delay_ms: refresh_ms,
            refresh_jitter_ms: 0,
            export_delay_ms: export_ms,
            ..Settings::default()
        }
    }

    fn wait_idle(d: &mut Dashboard) {
        for _ in 0..200 {
            d.poll_tasks();
            if !d.is_busy() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("background task did not finish");
    }

    fn level(d: &Dashboard) -> Option<NotificationLevel> {
        d.notifier.current().map(|n| n.level)
    }

    #[test]
    fn test_page_navigation_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.handle_key(KeyCode::Tab);
        assert_eq!(d.page, Page::Statement);
        d.handle_key(KeyCode::BackTab);
        d.handle_key(KeyCode::BackTab);
        assert_eq!(d.page, Page::Export);
        d.handle_key(KeyCode::Char('5'));
        assert_eq!(d.page, Page::Accounts);
        assert!(d.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_filter_panel_applies_on_enter() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.handle_key(KeyCode::Char('f'));
        assert!(d.panel.is_some());
        // Mode, Month, Currency
        d.handle_key(KeyCode::Down);
        d.handle_key(KeyCode::Left);
        d.handle_key(KeyCode::Down);
        d.handle_key(KeyCode::Right);
        assert_eq!(d.store.filters().moeda, Currency::Brl);
        d.handle_key(KeyCode::Enter);
        assert!(d.panel.is_none());
        d.sync_filters();
        assert_eq!(d.view.filters.moeda, Currency::Usd);
        assert_eq!(d.view.filters.period().label(), "Novembro 2024");
    }

    #[test]
    fn test_filter_panel_escape_discards() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        let before = d.store.filters();
        d.handle_key(KeyCode::Char('f'));
        d.handle_key(KeyCode::Right);
        d.handle_key(KeyCode::Esc);
        assert!(d.panel.is_none());
        assert_eq!(d.store.filters(), before);
        assert!(!d.filter_rx.has_changed().unwrap());
    }

    #[test]
    fn test_panel_round_trip_keeps_month() {
        let filters = Filters::default();
        let mut panel = FilterPanel::new(&filters, &PeriodSelector::new(filters.period()));
        panel.cursor = 1;
        panel.change(false);
        panel.cursor = 0;
        panel.change(true);
        assert_eq!(panel.selector.mode(), PeriodMode::Range);
        assert_eq!(panel.fields().len(), 5);
        panel.change(true);
        assert_eq!(panel.selector.config().label(), "Novembro 2024");
    }

    #[test]
    fn test_range_bounds_survive_reopening_panel() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        // Range mode seeds janeiro..dezembro 2024; pull the start back a month.
        d.handle_key(KeyCode::Char('f'));
        d.handle_key(KeyCode::Right);
        d.handle_key(KeyCode::Down);
        d.handle_key(KeyCode::Left);
        d.handle_key(KeyCode::Enter);
        let range = d.store.filters().period();
        assert_eq!(
            range,
            PeriodConfig::Range {
                start_month: "dezembro-2023".parse().unwrap(),
                end_month: "dezembro-2024".parse().unwrap(),
            }
        );

        // Back to month mode and apply.
        d.handle_key(KeyCode::Char('f'));
        d.handle_key(KeyCode::Right);
        d.handle_key(KeyCode::Enter);
        assert!(matches!(d.store.filters().period(), PeriodConfig::Month { .. }));

        // A fresh panel toggled to range restores the bounds entered earlier.
        d.handle_key(KeyCode::Char('f'));
        d.handle_key(KeyCode::Right);
        d.handle_key(KeyCode::Enter);
        assert_eq!(d.store.filters().period(), range);
    }

    #[test]
    fn test_panel_home_end_jump_to_calendar_bounds() {
        let filters = Filters::default();
        let mut panel = FilterPanel::new(&filters, &PeriodSelector::new(filters.period()));
        panel.cursor = 1;
        panel.handle_key(KeyCode::Home);
        assert_eq!(
            panel.selector.config(),
            PeriodConfig::Month { month: MonthToken::first() }
        );
        panel.handle_key(KeyCode::End);
        assert_eq!(
            panel.selector.config(),
            PeriodConfig::Month { month: MonthToken::last() }
        );
    }

    #[test]
    fn test_refresh_is_single_flight_and_cancellable() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 10_000, 0)).unwrap();
        d.handle_key(KeyCode::Char('r'));
        d.handle_key(KeyCode::Char('r'));
        assert_eq!(level(&d), Some(NotificationLevel::Error));
        d.handle_key(KeyCode::Char('c'));
        wait_idle(&mut d);
        assert_eq!(
            d.notifier.current().map(|n| n.message.as_str()),
            Some("Atualização cancelada")
        );
        assert!(!d.store.is_refreshing());
    }

    #[test]
    fn test_refresh_completes() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.handle_key(KeyCode::Char('r'));
        wait_idle(&mut d);
        assert_eq!(level(&d), Some(NotificationLevel::Success));
        assert!(d.store.last_refreshed().is_some());
    }

    #[test]
    fn test_export_writes_into_exports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.handle_key(KeyCode::Char('8'));
        d.handle_key(KeyCode::Right);
        assert_eq!(d.export_panel.format, ExportFormat::Csv);
        d.handle_key(KeyCode::Enter);
        wait_idle(&mut d);
        let path = d.last_export.clone().unwrap();
        assert!(path.starts_with(dir.path().join("exports")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("secao,item,valor,extra"));
    }

    #[test]
    fn test_export_requires_a_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.export_panel.options = ExportOptions {
            include_summary: false,
            include_statement: false,
            include_waterfall: false,
            include_expenses: false,
            include_insights: false,
        };
        d.handle_key(KeyCode::Char('e'));
        assert!(d.export.is_none());
        assert_eq!(level(&d), Some(NotificationLevel::Error));
    }

    #[test]
    fn test_second_export_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 10_000)).unwrap();
        d.handle_key(KeyCode::Char('e'));
        assert!(d.export.is_some());
        d.handle_key(KeyCode::Char('e'));
        assert_eq!(level(&d), Some(NotificationLevel::Error));
        assert_eq!(
            d.notifier.current().map(|n| n.message.clone()),
            Some(DreError::ExportInFlight.to_string())
        );
        d.handle_key(KeyCode::Char('c'));
        wait_idle(&mut d);
        assert!(d.export.is_none());
    }

    #[test]
    fn test_admin_modal_captures_global_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.handle_key(KeyCode::Char('5'));
        d.handle_key(KeyCode::Char('a'));
        assert!(d.admin_captures_input());
        assert!(!d.handle_key(KeyCode::Char('q')));
        assert!(d.refresh.is_none());
        d.handle_key(KeyCode::Esc);
        assert!(!d.admin_captures_input());
    }

    #[test]
    fn test_resize_updates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        d.resize(60, 30);
        assert!(d.responsive().is_mobile());
        assert!(d.responsive().should_stack_vertically());
        d.resize(200, 50);
        assert!(d.responsive().is_desktop());
        assert_eq!(d.responsive().columns_grid(), 6);
    }

    #[test]
    fn test_every_page_draws() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = Dashboard::new(&settings(dir.path(), 0, 0)).unwrap();
        for (cols, rows) in [(160, 48), (70, 40)] {
            d.resize(cols, rows);
            let mut terminal = Terminal::new(TestBackend::new(cols, rows)).unwrap();
            for page in Page::ALL {
                d.set_page(page);
                terminal.draw(|frame| d.draw(frame)).unwrap();
            }
            d.handle_key(KeyCode::Char('f'));
            terminal.draw(|frame| d.draw(frame)).unwrap();
            d.handle_key(KeyCode::Esc);
        }
        let buffer = {
            let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
            d.resize(160, 48);
            d.set_page(Page::Overview);
            terminal.draw(|frame| d.draw(frame)).unwrap();
            terminal.backend().buffer().clone()
        };
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("DRE Analytics"));
        assert!(text.contains("Receita Bruta"));
        assert!(text.contains("Visão Geral"));
    }
}
