use ratatui::style::{Color, Style};

/// Keypresses a notification survives before it is cleared.
const DEFAULT_TTL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

impl NotificationLevel {
    pub fn style(&self) -> Style {
        match self {
            NotificationLevel::Success => Style::new().fg(Color::Rgb(80, 220, 100)),
            NotificationLevel::Error => Style::new().fg(Color::Red),
            NotificationLevel::Info => Style::new().fg(Color::Yellow),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// A single transient, dismissible status line.
#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<Notification>,
    ttl: u8,
}

impl Notifier {
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.current = Some(Notification {
            level,
            message: message.into(),
        });
        self.ttl = DEFAULT_TTL;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    /// Count down one keypress; clears the notification when it expires.
    pub fn tick(&mut self) {
        if self.ttl > 0 {
            self.ttl -= 1;
            if self.ttl == 0 {
                self.current = None;
            }
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
        self.ttl = 0;
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_expires_after_ttl() {
        let mut n = Notifier::default();
        n.error("Campo obrigatório: Nome");
        for _ in 0..DEFAULT_TTL - 1 {
            n.tick();
            assert!(n.current().is_some());
        }
        n.tick();
        assert!(n.current().is_none());
    }

    #[test]
    fn test_new_notification_replaces_old() {
        let mut n = Notifier::default();
        n.error("falhou");
        n.success("salvo");
        let cur = n.current().unwrap();
        assert_eq!(cur.level, NotificationLevel::Success);
        assert_eq!(cur.message, "salvo");
        n.dismiss();
        assert!(n.current().is_none());
    }
}
