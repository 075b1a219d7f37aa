//! ratatui rendering of the report view models. Line builders are separated from
//! drawing so they can be checked without a terminal.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::filters::Filters;
use crate::fmt::{percent, signed_percent};
use crate::models::{Insight, ResultItem};
use crate::reports::{
    ExpenseSlice, LineKind, MetricCard, MetricFormat, MonthlyBar, Statement, StepKind, TrendItem,
    Waterfall,
};
use crate::tui::{
    delta_span, money_span, wrap_text, AMOUNT_NEG_STYLE, AMOUNT_POS_STYLE, BORDER_STYLE,
    FOOTER_STYLE, TITLE_STYLE,
};

const LABEL_WIDTH: usize = 26;

fn title_line(title: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {title}"), TITLE_STYLE))
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

fn metric_delta_span(card: &MetricCard) -> Span<'static> {
    match (card.format, card.delta) {
        (MetricFormat::Percent, Some(d)) => {
            let style = if d >= 0.0 { AMOUNT_POS_STYLE } else { AMOUNT_NEG_STYLE };
            let pp = format!("{d:+.1}").replace('.', ",");
            Span::styled(format!("{pp} p.p."), style)
        }
        (_, delta) => delta_span(delta, true),
    }
}

pub fn metric_card_lines(card: &MetricCard, filters: &Filters) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            card.display_value(filters),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            metric_delta_span(card),
            Span::styled(" vs período anterior", FOOTER_STYLE),
        ]),
    ]
}

/// Cards laid out in a grid of `columns` columns, one bordered box each.
pub fn draw_metric_cards(
    frame: &mut Frame,
    area: Rect,
    cards: &[MetricCard],
    filters: &Filters,
    columns: usize,
) {
    let columns = columns.clamp(1, cards.len().max(1));
    let rows: Vec<&[MetricCard]> = cards.chunks(columns).collect();
    let row_areas = Layout::vertical(vec![Constraint::Length(4); rows.len()]).split(area);

    for (row, row_area) in rows.iter().zip(row_areas.iter()) {
        let col_areas =
            Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns]).split(*row_area);
        for (card, col_area) in row.iter().zip(col_areas.iter()) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(BORDER_STYLE)
                .title(Span::styled(format!(" {} ", card.title), TITLE_STYLE));
            frame.render_widget(
                Paragraph::new(metric_card_lines(card, filters)).block(block),
                *col_area,
            );
        }
    }
}

/// Rows needed by `draw_metric_cards`.
pub fn metric_cards_height(count: usize, columns: usize) -> u16 {
    let columns = columns.max(1);
    (count.div_ceil(columns) * 4) as u16
}

// ---------------------------------------------------------------------------
// DRE statement
// ---------------------------------------------------------------------------

pub fn statement_lines(statement: &Statement, filters: &Filters) -> Vec<Line<'static>> {
    let mut lines = vec![
        title_line(&format!("Demonstrativo de Resultado - {}", statement.period)),
        Line::from(Span::styled(
            format!(
                " {:<width$} {:>20} {:>8}",
                "Conta",
                "Valor",
                "AV %",
                width = LABEL_WIDTH
            ),
            FOOTER_STYLE.add_modifier(Modifier::BOLD),
        )),
    ];
    for line in &statement.lines {
        let style = match line.kind {
            LineKind::Subtotal | LineKind::Total => Style::default().add_modifier(Modifier::BOLD),
            LineKind::Revenue | LineKind::Deduction => Style::default(),
        };
        let av = line.vertical_pct.map(|v| percent(v, 1)).unwrap_or_default();
        let value = money_span(line.value, filters);
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<width$} ", line.label, width = LABEL_WIDTH), style),
            Span::styled(format!("{:>20}", value.content), value.style.patch(style)),
            Span::styled(format!(" {av:>8}"), FOOTER_STYLE),
        ]));
    }
    lines
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

/// One horizontal bar per step, offset so each decrease hangs from the running
/// total. `bar_width` is the width of the tallest bar.
pub fn waterfall_lines(waterfall: &Waterfall, filters: &Filters, bar_width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![title_line("Cascata do Resultado")];
    let peak = waterfall.peak();
    let scale = if peak > 0.0 { bar_width as f64 / peak } else { 0.0 };

    for step in &waterfall.steps {
        let lo = step.start.min(step.end).max(0.0);
        let hi = step.start.max(step.end).max(0.0);
        let offset = (lo * scale).round() as usize;
        let len = ((hi - lo) * scale).round().max(1.0) as usize;
        let color = match step.kind {
            StepKind::Total if step.end >= 0.0 => Color::Cyan,
            StepKind::Total => Color::Red,
            StepKind::Decrease => Color::Rgb(255, 120, 120),
        };
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<24}", step.label)),
            Span::raw(" ".repeat(offset)),
            Span::styled("█".repeat(len), Style::default().fg(color)),
            Span::styled(format!(" {}", filters.compact(step.delta)), FOOTER_STYLE),
        ]));
    }
    lines
}

pub fn draw_waterfall(frame: &mut Frame, area: Rect, waterfall: &Waterfall, filters: &Filters) {
    // label + value columns
    let bar_width = (area.width as usize).saturating_sub(25 + 12).max(4);
    frame.render_widget(
        Paragraph::new(waterfall_lines(waterfall, filters, bar_width)),
        area,
    );
}

// ---------------------------------------------------------------------------
// Expense composition
// ---------------------------------------------------------------------------

/// A single stacked strip plus a legend, in place of a pie.
pub fn expense_lines(slices: &[ExpenseSlice], filters: &Filters, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![title_line("Composição das Despesas")];

    let strip: Vec<Span<'static>> = std::iter::once(Span::raw(" "))
        .chain(slices.iter().map(|s| {
            let cells = ((s.percent / 100.0) * width as f64).round() as usize;
            Span::styled("█".repeat(cells), Style::default().fg(s.category.color()))
        }))
        .collect();
    lines.push(Line::from(strip));

    for s in slices {
        lines.push(Line::from(vec![
            Span::styled(" ■ ", Style::default().fg(s.category.color())),
            Span::raw(format!("{:<16}", s.category.label())),
            Span::styled(format!("{:>5}  ", percent(s.percent, 0)), FOOTER_STYLE),
            Span::raw(filters.money(s.value)),
        ]));
    }
    lines
}

pub fn draw_expenses(frame: &mut Frame, area: Rect, slices: &[ExpenseSlice], filters: &Filters) {
    let width = (area.width as usize).saturating_sub(2).max(6);
    frame.render_widget(Paragraph::new(expense_lines(slices, filters, width)), area);
}

// ---------------------------------------------------------------------------
// Monthly bars
// ---------------------------------------------------------------------------

/// Pick nice round y-axis tick values (top and mid) given a max data value.
pub fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1000000.0, 1500000.0, 2500000.0, 5000000.0, 10000000.0, 25000000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    (top, top / 2.0)
}

pub fn draw_monthly_bars(frame: &mut Frame, area: Rect, bars: &[MonthlyBar], filters: &Filters) {
    let [title_area, legend_area, chart_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(title_line("Receitas x Despesas")), title_area);

    let income_style = Style::default().fg(Color::Rgb(80, 220, 100));
    let expense_style = Style::default().fg(Color::Red);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ■ Receita  ", income_style),
            Span::styled("■ Despesas", expense_style),
        ])),
        legend_area,
    );

    if bars.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" Nenhum mês no período selecionado.", FOOTER_STYLE)),
            chart_area,
        );
        return;
    }

    let max_val = bars
        .iter()
        .map(|b| b.receita.max(b.despesas))
        .fold(1.0, f64::max);
    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = filters.compact(top_tick);
    let mid_label = filters.compact(mid_tick);
    let y_label_width = top_label.chars().count().max(mid_label.chars().count()) as u16 + 1;

    let [y_axis_area, bar_area] =
        Layout::horizontal([Constraint::Length(y_label_width), Constraint::Fill(1)])
            .areas(chart_area);

    // month labels take the last row
    let inner_height = bar_area.height.saturating_sub(1);
    let mid_row = inner_height / 2;
    let y_lines: Vec<Line> = (0..inner_height)
        .map(|row| {
            let label = if row == 0 {
                top_label.as_str()
            } else if row == mid_row {
                mid_label.as_str()
            } else {
                ""
            };
            Line::from(Span::styled(
                format!("{:>width$}", label, width = y_label_width as usize),
                FOOTER_STYLE,
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);

    let groups: Vec<BarGroup> = bars
        .iter()
        .map(|b| {
            let values = [
                Bar::default()
                    .value(b.receita.max(0.0) as u64)
                    .text_value(filters.compact(b.receita))
                    .style(income_style),
                Bar::default()
                    .value(b.despesas.max(0.0) as u64)
                    .text_value(filters.compact(b.despesas))
                    .style(expense_style),
            ];
            BarGroup::default()
                .label(Line::from(b.month.short_label()))
                .bars(&values)
        })
        .collect();

    let mut chart = BarChart::default()
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2)
        .max(top_tick as u64);
    for group in groups {
        chart = chart.data(group);
    }
    frame.render_widget(chart, bar_area);
}

// ---------------------------------------------------------------------------
// Trends, insights, results
// ---------------------------------------------------------------------------

pub fn trend_lines(trends: &[TrendItem], filters: &Filters) -> Vec<Line<'static>> {
    let mut lines = vec![
        title_line("Tendência Mensal"),
        Line::from(Span::styled(
            format!(" {:<8} {:>18} {:>8} {:>18} {:>8}", "Mês", "Receita", "Var.", "Lucro", "Var."),
            FOOTER_STYLE.add_modifier(Modifier::BOLD),
        )),
    ];
    for t in trends {
        let receita_delta = delta_span(t.receita_delta, true);
        let lucro_delta = delta_span(t.lucro_delta, true);
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<8} ", t.month.short_label())),
            Span::raw(format!("{:>18} ", filters.money(t.receita))),
            Span::styled(format!("{:>8} ", receita_delta.content), receita_delta.style),
            Span::raw(format!("{:>18} ", filters.money(t.lucro))),
            Span::styled(format!("{:>8}", lucro_delta.content), lucro_delta.style),
        ]));
    }
    lines
}

pub fn insight_lines(insights: &[Insight], width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![title_line("Insights")];
    for insight in insights {
        let kind_style = Style::default().fg(insight.kind.color());
        let mut head = vec![
            Span::styled(format!(" {} ", insight.kind.icon()), kind_style),
            Span::styled(insight.title.to_string(), kind_style.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  impacto {}", insight.impact.label().to_lowercase()),
                Style::default().fg(insight.impact.color()),
            ),
        ];
        if let Some(v) = insight.value {
            head.push(Span::raw(format!("  {v}")));
        }
        lines.push(Line::from(head));

        let (wrapped, _) = wrap_text(insight.description, width.saturating_sub(4));
        for text in wrapped.lines() {
            lines.push(Line::from(Span::styled(format!("   {text}"), FOOTER_STYLE)));
        }
        lines.push(Line::from(""));
    }
    lines
}

pub fn result_lines(results: &[ResultItem], filters: &Filters) -> Vec<Line<'static>> {
    let mut lines = vec![title_line("Principais Resultados")];
    for r in results {
        let variation = Span::styled(
            signed_percent(r.variation),
            delta_span(Some(r.variation), r.category.growth_is_good()).style,
        );
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<10}", r.category.label()),
                Style::default().fg(r.category.color()),
            ),
            Span::raw(format!("{:<32}", r.label)),
            Span::raw(format!("{:>18}  ", filters.money(r.value))),
            variation,
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks(1_450_000.0), (1_500_000.0, 750_000.0));
        assert_eq!(y_axis_ticks(800.0), (1000.0, 500.0));
    }

    #[test]
    fn test_waterfall_bars_scale_to_peak() {
        let filters = Filters::default();
        let w = reports::get_waterfall(&filters);
        let lines = waterfall_lines(&w, &filters, 40);
        assert_eq!(lines.len(), 6);
        // gross revenue spans the whole width
        assert_eq!(lines[1].spans[2].content.chars().count(), 40);
        assert!(text(&lines[1]).contains("R$ 1,"));
        // net profit bar starts at zero
        assert_eq!(lines[5].spans[1].content, "");
    }

    #[test]
    fn test_waterfall_decrease_hangs_from_running_total() {
        let filters = Filters::default();
        let w = crate::reports::waterfall(crate::data::MonthlyFigures {
            receita: 1000.0,
            despesas: 100.0,
            lucro: 120.0,
        });
        let lines = waterfall_lines(&w, &filters, 100);
        // deductions: 1000 -> 820, offset 82, length 18
        assert_eq!(lines[2].spans[1].content.len(), 82);
        assert_eq!(lines[2].spans[2].content.chars().count(), 18);
    }

    #[test]
    fn test_statement_lines_cover_every_line() {
        let filters = Filters::default();
        let statement = reports::get_statement(&filters);
        let lines = statement_lines(&statement, &filters);
        assert_eq!(lines.len(), statement.lines.len() + 2);
        assert!(text(&lines[2]).contains("Receita Bruta"));
        assert!(text(&lines[2]).contains("100,0%"));
    }

    #[test]
    fn test_metric_cards_height() {
        assert_eq!(metric_cards_height(5, 1), 20);
        assert_eq!(metric_cards_height(5, 3), 8);
        assert_eq!(metric_cards_height(5, 6), 4);
    }

    #[test]
    fn test_insight_descriptions_wrap() {
        let insights = reports::get_insights();
        let lines = insight_lines(&insights, 30);
        assert!(lines.len() > insights.len() * 3);
    }
}
