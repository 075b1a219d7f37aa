use crossterm::event::KeyCode;

/// One editable field of a modal form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Selector { options: Vec<String>, selected: usize },
    Toggle { on: bool },
}

impl FormField {
    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn selector(label: &'static str, options: &[&str], selected: usize) -> Self {
        let selected = selected.min(options.len().saturating_sub(1));
        Self {
            label,
            value: options.get(selected).map(|s| s.to_string()).unwrap_or_default(),
            kind: FieldKind::Selector {
                options: options.iter().map(|s| s.to_string()).collect(),
                selected,
            },
        }
    }

    pub fn toggle(label: &'static str, on: bool) -> Self {
        Self {
            label,
            value: toggle_label(on).to_string(),
            kind: FieldKind::Toggle { on },
        }
    }

    pub fn selected_index(&self) -> usize {
        match &self.kind {
            FieldKind::Selector { selected, .. } => *selected,
            _ => 0,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self.kind, FieldKind::Toggle { on: true })
    }
}

fn toggle_label(on: bool) -> &'static str {
    if on {
        "Ativo"
    } else {
        "Inativo"
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focused: usize,
}

/// What a keypress asked the form's owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    Edited,
    Submit,
    Cancel,
    Ignored,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// Trimmed text value.
    pub fn text(&self, idx: usize) -> String {
        self.value(idx).trim().to_string()
    }

    pub fn selected(&self, idx: usize) -> usize {
        self.fields.get(idx).map(FormField::selected_index).unwrap_or(0)
    }

    pub fn is_on(&self, idx: usize) -> bool {
        self.fields.get(idx).map(FormField::is_on).unwrap_or(false)
    }

    #[cfg(test)]
    pub fn set_text(&mut self, idx: usize, value: &str) {
        if let Some(field) = self.fields.get_mut(idx) {
            if let FieldKind::Text = field.kind {
                field.value = value.to_string();
            }
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = if self.focused == 0 {
                self.fields.len() - 1
            } else {
                self.focused - 1
            };
        }
    }

    fn cycle(&mut self, forward: bool) {
        let Some(field) = self.fields.get_mut(self.focused) else {
            return;
        };
        match &mut field.kind {
            FieldKind::Selector { options, selected } => {
                if options.is_empty() {
                    return;
                }
                *selected = if forward {
                    (*selected + 1) % options.len()
                } else if *selected == 0 {
                    options.len() - 1
                } else {
                    *selected - 1
                };
                field.value = options[*selected].clone();
            }
            FieldKind::Toggle { on } => {
                *on = !*on;
                field.value = toggle_label(*on).to_string();
            }
            FieldKind::Text => {}
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormKey {
        match code {
            KeyCode::Esc => return FormKey::Cancel,
            KeyCode::Enter => return FormKey::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Left => self.cycle(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Char(' ') if !self.focused_is_text() => self.cycle(true),
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    if let FieldKind::Text = field.kind {
                        field.value.push(c);
                    } else {
                        return FormKey::Ignored;
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    if let FieldKind::Text = field.kind {
                        field.value.pop();
                    }
                }
            }
            _ => return FormKey::Ignored,
        }
        FormKey::Edited
    }

    fn focused_is_text(&self) -> bool {
        matches!(
            self.fields.get(self.focused).map(|f| &f.kind),
            Some(FieldKind::Text)
        )
    }
}
