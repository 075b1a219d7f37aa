use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::filters::Filters;
use crate::fmt::signed_percent;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const FOCUS_STYLE: Style = Style::new().fg(Color::Cyan);

pub const WARNING_STYLE: Style = Style::new().fg(Color::Yellow);

/// Format an amount as a colored Span (green for positive, red for negative)
/// in the selected currency and precision.
pub fn money_span(amount: f64, filters: &Filters) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(filters.money(amount), style)
}

/// Signed percentage change, colored by whether the direction is favourable.
pub fn delta_span(delta: Option<f64>, growth_is_good: bool) -> Span<'static> {
    match delta {
        None => Span::styled("-", FOOTER_STYLE),
        Some(d) => {
            let good = if growth_is_good { d >= 0.0 } else { d <= 0.0 };
            let style = if good { AMOUNT_POS_STYLE } else { AMOUNT_NEG_STYLE };
            Span::styled(signed_percent(d), style)
        }
    }
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Full-width thick separator line.
pub fn separator(width: u16) -> String {
    "━".repeat(width as usize)
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}
