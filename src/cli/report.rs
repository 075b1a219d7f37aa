use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::ReportView;
use crate::error::Result;
use crate::filters::Filters;
use crate::fmt::{percent, signed_percent};
use crate::models::InsightType;
use crate::reports::{self, LineKind};

pub fn run(view: ReportView, filters: &Filters) -> Result<()> {
    println!("{}", render(view, filters));
    Ok(())
}

/// Title, period banner and table for one report.
pub fn render(view: ReportView, filters: &Filters) -> String {
    let (title, table) = match view {
        ReportView::Summary => ("Resumo", summary(filters)),
        ReportView::Statement => ("Demonstrativo de Resultado", statement(filters)),
        ReportView::Waterfall => ("Cascata do Resultado", waterfall(filters)),
        ReportView::Expenses => ("Composição das Despesas", expenses(filters)),
        ReportView::Trends => ("Tendências Mensais", trends(filters)),
        ReportView::Insights => ("Insights", insights()),
        ReportView::Results => ("Principais Resultados", results(filters)),
    };

    let period = filters.period();
    let mut out = format!(
        "{}\n{} ({})\n",
        title.bold(),
        period.label(),
        filters.moeda.code()
    );
    if period.is_inverted() {
        out.push_str(&format!(
            "{}\n",
            "Aviso: início depois do fim; nenhum mês no período.".yellow()
        ));
    }
    out.push_str(&table.to_string());
    out
}

fn right(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).set_alignment(CellAlignment::Right)
}

fn summary(filters: &Filters) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Indicador", "Valor", "Anterior", "Variação"]);
    for card in reports::get_metrics(filters) {
        let previous = match card.previous {
            Some(p) => reports::MetricCard {
                value: p,
                ..card.clone()
            }
            .display_value(filters),
            None => "-".to_string(),
        };
        let delta = card.display_delta();
        let delta = match card.delta {
            Some(d) if d < 0.0 => delta.red().to_string(),
            Some(_) => delta.green().to_string(),
            None => delta,
        };
        table.add_row(vec![
            Cell::new(card.title),
            right(card.display_value(filters)),
            right(previous),
            right(delta),
        ]);
    }
    table
}

fn statement(filters: &Filters) -> Table {
    let statement = reports::get_statement(filters);
    let mut table = Table::new();
    table.set_header(vec!["Conta", "Valor", "AV %"]);
    for line in &statement.lines {
        let label = match line.kind {
            LineKind::Revenue => line.label.to_string(),
            LineKind::Deduction => format!("  {}", line.label),
            LineKind::Subtotal => line.label.bold().to_string(),
            LineKind::Total if line.value < 0.0 => line.label.red().bold().to_string(),
            LineKind::Total => line.label.green().bold().to_string(),
        };
        table.add_row(vec![
            Cell::new(label),
            right(filters.money(line.value)),
            right(line.vertical_pct.map(|v| percent(v, 1)).unwrap_or_default()),
        ]);
    }
    table
}

fn waterfall(filters: &Filters) -> Table {
    let waterfall = reports::get_waterfall(filters);
    let mut table = Table::new();
    table.set_header(vec!["Etapa", "Variação", "Início", "Fim"]);
    for step in &waterfall.steps {
        table.add_row(vec![
            Cell::new(step.label),
            right(filters.compact(step.delta)),
            right(filters.compact(step.start)),
            right(filters.compact(step.end)),
        ]);
    }
    table
}

fn expenses(filters: &Filters) -> Table {
    let slices = reports::get_expense_breakdown(filters);
    let mut table = Table::new();
    table.set_header(vec!["Categoria", "Valor", "%"]);
    let mut total = 0.0;
    for slice in &slices {
        total += slice.value;
        table.add_row(vec![
            Cell::new(slice.category.label()),
            right(filters.money(slice.value)),
            right(percent(slice.percent, 0)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        right(filters.money(total)),
        Cell::new(""),
    ]);
    table
}

fn delta_cell(delta: Option<f64>) -> Cell {
    match delta {
        None => right("-"),
        Some(d) if d < 0.0 => right(signed_percent(d).red().to_string()),
        Some(d) => right(signed_percent(d).green().to_string()),
    }
}

fn trends(filters: &Filters) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Mês", "Receita", "Var.", "Lucro", "Var."]);
    for item in reports::get_trends(filters) {
        table.add_row(vec![
            Cell::new(item.month.label()),
            right(filters.money(item.receita)),
            delta_cell(item.receita_delta),
            right(filters.money(item.lucro)),
            delta_cell(item.lucro_delta),
        ]);
    }
    table
}

fn insights() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Impacto", "Tipo", "Insight", "Valor"]);
    for insight in reports::get_insights() {
        let kind = match insight.kind {
            InsightType::Positive => insight.kind.label().green(),
            InsightType::Negative => insight.kind.label().red(),
            InsightType::Warning => insight.kind.label().yellow(),
            InsightType::Info => insight.kind.label().cyan(),
        };
        table.add_row(vec![
            Cell::new(insight.impact.label()),
            Cell::new(kind),
            Cell::new(format!("{}\n{}", insight.title.bold(), insight.description)),
            right(insight.value.unwrap_or("")),
        ]);
    }
    table
}

fn results(filters: &Filters) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Categoria", "Item", "Valor", "Variação"]);
    for item in reports::get_results() {
        let good = if item.category.growth_is_good() {
            item.variation >= 0.0
        } else {
            item.variation <= 0.0
        };
        let variation = signed_percent(item.variation);
        let variation = if good { variation.green() } else { variation.red() };
        table.add_row(vec![
            Cell::new(item.category.label()),
            Cell::new(item.label),
            right(filters.money(item.value)),
            right(variation.to_string()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{PeriodConfig, Periodo};

    fn range(a: &str, b: &str) -> Filters {
        Filters {
            periodo: Periodo::Config(PeriodConfig::Range {
                start_month: a.parse().unwrap(),
                end_month: b.parse().unwrap(),
            }),
            ..Filters::default()
        }
    }

    #[test]
    fn test_statement_report_lists_every_line() {
        let out = render(ReportView::Statement, &Filters::default());
        assert!(out.contains("Dezembro 2024 (BRL)"));
        for label in ["Receita Bruta", "EBITDA", "Lucro Líquido"] {
            assert!(out.contains(label), "missing {label}");
        }
        assert!(out.contains("R$ 1.450.000,00"));
    }

    #[test]
    fn test_precision_applies_to_full_values_only() {
        let f = Filters {
            precisao: "0".parse().unwrap(),
            ..Filters::default()
        };
        assert!(render(ReportView::Statement, &f).contains("R$ 1.450.000"));
        assert!(!render(ReportView::Statement, &f).contains("1.450.000,00"));
        assert!(render(ReportView::Waterfall, &f).contains("M"));
    }

    #[test]
    fn test_inverted_range_warns() {
        let out = render(ReportView::Summary, &range("junho-2024", "janeiro-2024"));
        assert!(out.contains("nenhum mês no período"));
        let ok = render(ReportView::Summary, &range("janeiro-2024", "junho-2024"));
        assert!(!ok.contains("nenhum mês no período"));
    }

    #[test]
    fn test_trends_and_expenses() {
        let f = range("janeiro-2024", "marco-2024");
        let trends = render(ReportView::Trends, &f);
        assert!(trends.contains("Janeiro 2024"));
        assert!(trends.contains("Março 2024"));
        let expenses = render(ReportView::Expenses, &f);
        assert!(expenses.contains("Pessoal"));
        assert!(expenses.contains("Total"));
    }

    #[test]
    fn test_insights_and_results_are_static() {
        let insights = render(ReportView::Insights, &Filters::default());
        assert!(insights.contains("Impacto"));
        let results = render(ReportView::Results, &Filters::default());
        assert!(results.contains("Variação"));
    }
}
