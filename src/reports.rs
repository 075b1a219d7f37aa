use serde::Serialize;

use crate::data::{self, MonthlyFigures, COGS_RATIO, DEDUCTIONS_RATIO};
use crate::filters::Filters;
use crate::fmt::{pct_delta, percent, signed_percent};
use crate::models::{ExpenseCategory, Insight, ResultItem};
use crate::period::{MonthToken, PeriodConfig};

/// Months shown by the monthly chart when a single month is selected.
pub const TRAILING_MONTHS: usize = 6;

// ---------------------------------------------------------------------------
// DRE statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Revenue,
    Deduction,
    Subtotal,
    Total,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementLine {
    pub label: &'static str,
    pub kind: LineKind,
    pub value: f64,
    /// Share of gross revenue, in percent.
    pub vertical_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub period: String,
    pub months: usize,
    pub lines: Vec<StatementLine>,
}

impl Statement {
    #[cfg(test)]
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.lines.iter().find(|l| l.label == label).map(|l| l.value)
    }
}

/// Income statement lines derived from the base figures.
pub struct DreLines {
    pub receita_bruta: f64,
    pub deducoes: f64,
    pub receita_liquida: f64,
    pub cmv: f64,
    pub lucro_bruto: f64,
    pub despesas_operacionais: f64,
    pub ebitda: f64,
    pub outros_resultados: f64,
    pub lucro_liquido: f64,
}

impl DreLines {
    pub fn from_figures(f: MonthlyFigures) -> Self {
        let deducoes = f.receita * DEDUCTIONS_RATIO;
        let cmv = f.receita * COGS_RATIO;
        let receita_liquida = f.receita - deducoes;
        let lucro_bruto = receita_liquida - cmv;
        let ebitda = lucro_bruto - f.despesas;
        Self {
            receita_bruta: f.receita,
            deducoes,
            receita_liquida,
            cmv,
            lucro_bruto,
            despesas_operacionais: f.despesas,
            ebitda,
            outros_resultados: f.lucro - ebitda,
            lucro_liquido: f.lucro,
        }
    }

    /// Net margin in percent, `None` without revenue.
    pub fn net_margin(&self) -> Option<f64> {
        if self.receita_bruta == 0.0 {
            None
        } else {
            Some(self.lucro_liquido / self.receita_bruta * 100.0)
        }
    }
}

fn period_figures(filters: &Filters) -> MonthlyFigures {
    data::aggregate(&filters.period().months())
}

fn previous_figures(filters: &Filters) -> Option<MonthlyFigures> {
    let prev = filters.period().previous_months();
    if prev.is_empty() {
        None
    } else {
        Some(data::aggregate(&prev))
    }
}

pub fn get_statement(filters: &Filters) -> Statement {
    let period = filters.period();
    let d = DreLines::from_figures(period_figures(filters));
    let vertical = |v: f64| {
        if d.receita_bruta == 0.0 {
            None
        } else {
            Some(v / d.receita_bruta * 100.0)
        }
    };
    let line = |label, kind, value: f64| StatementLine {
        label,
        kind,
        value,
        vertical_pct: vertical(value),
    };
    Statement {
        period: period.label(),
        months: period.months().len(),
        lines: vec![
            line("Receita Bruta", LineKind::Revenue, d.receita_bruta),
            line("(-) Deduções", LineKind::Deduction, -d.deducoes),
            line("Receita Líquida", LineKind::Subtotal, d.receita_liquida),
            line("(-) CMV", LineKind::Deduction, -d.cmv),
            line("Lucro Bruto", LineKind::Subtotal, d.lucro_bruto),
            line("(-) Despesas Operacionais", LineKind::Deduction, -d.despesas_operacionais),
            line("EBITDA", LineKind::Subtotal, d.ebitda),
            line("Outros Resultados", LineKind::Revenue, d.outros_resultados),
            line("Lucro Líquido", LineKind::Total, d.lucro_liquido),
        ],
    }
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricFormat {
    Currency,
    Percent,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: f64,
    pub previous: Option<f64>,
    /// Relative change vs the previous period (percent), or percentage-point
    /// change for percent metrics.
    pub delta: Option<f64>,
    pub format: MetricFormat,
}

impl MetricCard {
    pub fn display_value(&self, filters: &Filters) -> String {
        match self.format {
            MetricFormat::Currency => filters.money(self.value),
            MetricFormat::Percent => percent(self.value, 1),
        }
    }

    /// `+4,8%` for currency metrics, `+1,2 p.p.` for percent metrics.
    pub fn display_delta(&self) -> String {
        match (self.format, self.delta) {
            (_, None) => "-".to_string(),
            (MetricFormat::Currency, Some(d)) => signed_percent(d),
            (MetricFormat::Percent, Some(d)) => {
                format!("{} p.p.", format!("{d:+.1}").replace('.', ","))
            }
        }
    }
}

pub fn get_metrics(filters: &Filters) -> Vec<MetricCard> {
    let cur = DreLines::from_figures(period_figures(filters));
    let prev = previous_figures(filters).map(DreLines::from_figures);

    let money = |title, pick: fn(&DreLines) -> f64| {
        let value = pick(&cur);
        let previous = prev.as_ref().map(pick);
        MetricCard {
            title,
            value,
            previous,
            delta: previous.and_then(|p| pct_delta(value, p)),
            format: MetricFormat::Currency,
        }
    };

    let margin = cur.net_margin().unwrap_or(0.0);
    let prev_margin = prev.as_ref().and_then(DreLines::net_margin);

    vec![
        money("Receita Bruta", |d| d.receita_bruta),
        money("Receita Líquida", |d| d.receita_liquida),
        money("EBITDA", |d| d.ebitda),
        money("Lucro Líquido", |d| d.lucro_liquido),
        MetricCard {
            title: "Margem Líquida",
            value: margin,
            previous: prev_margin,
            delta: prev_margin.map(|p| margin - p),
            format: MetricFormat::Percent,
        },
    ]
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    /// Bar from zero to the running total.
    Total,
    /// Bar hanging from the running total down by `delta`.
    Decrease,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterfallStep {
    pub label: &'static str,
    pub kind: StepKind,
    /// Signed contribution of this step.
    pub delta: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Waterfall {
    pub steps: Vec<WaterfallStep>,
}

impl Waterfall {
    /// Largest bar top, used to scale rendering.
    pub fn peak(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| s.start.max(s.end))
            .fold(0.0, f64::max)
    }
}

/// Five-step cascade from the base figures: gross revenue, deductions
/// (`receita * 0.18`), CMV (`receita * 0.6`), operating expenses, net profit.
/// These ratios are a presentation convention, not an accounting model.
pub fn waterfall(f: MonthlyFigures) -> Waterfall {
    let decreases = [
        ("Deduções", f.receita * DEDUCTIONS_RATIO),
        ("CMV", f.receita * COGS_RATIO),
        ("Despesas Operacionais", f.despesas),
    ];

    let mut steps = vec![WaterfallStep {
        label: "Receita Bruta",
        kind: StepKind::Total,
        delta: f.receita,
        start: 0.0,
        end: f.receita,
    }];
    let mut running = f.receita;
    for (label, amount) in decreases {
        steps.push(WaterfallStep {
            label,
            kind: StepKind::Decrease,
            delta: -amount,
            start: running,
            end: running - amount,
        });
        running -= amount;
    }
    steps.push(WaterfallStep {
        label: "Lucro Líquido",
        kind: StepKind::Total,
        delta: running,
        start: 0.0,
        end: running,
    });
    Waterfall { steps }
}

pub fn get_waterfall(filters: &Filters) -> Waterfall {
    waterfall(period_figures(filters))
}

// ---------------------------------------------------------------------------
// Expense composition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSlice {
    pub category: ExpenseCategory,
    pub value: f64,
    pub percent: f64,
}

pub fn get_expense_breakdown(filters: &Filters) -> Vec<ExpenseSlice> {
    let total = period_figures(filters).despesas;
    ExpenseCategory::ALL
        .iter()
        .map(|c| ExpenseSlice {
            category: *c,
            value: total * c.share(),
            percent: c.share() * 100.0,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly series and trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBar {
    pub month: MonthToken,
    pub receita: f64,
    pub despesas: f64,
    pub lucro: f64,
}

/// Months plotted for the current filter: the covered months of a range, or the
/// trailing window ending at the selected month.
pub fn series_months(filters: &Filters) -> Vec<MonthToken> {
    let period = filters.period();
    match period {
        PeriodConfig::Range { .. } => period.months(),
        PeriodConfig::Month { month } => {
            let mut months = vec![month];
            let mut cursor = month.prev();
            while let Some(m) = cursor {
                if months.len() == TRAILING_MONTHS {
                    break;
                }
                months.push(m);
                cursor = m.prev();
            }
            months.reverse();
            months
        }
    }
}

pub fn get_monthly_series(filters: &Filters) -> Vec<MonthlyBar> {
    series_months(filters)
        .into_iter()
        .map(|month| {
            let f = data::monthly(month);
            MonthlyBar {
                month,
                receita: f.receita,
                despesas: f.despesas,
                lucro: f.lucro,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendItem {
    pub month: MonthToken,
    pub receita: f64,
    pub lucro: f64,
    /// Month-over-month change in percent; `None` for the first calendar month.
    pub receita_delta: Option<f64>,
    pub lucro_delta: Option<f64>,
}

pub fn get_trends(filters: &Filters) -> Vec<TrendItem> {
    series_months(filters)
        .into_iter()
        .map(|month| {
            let f = data::monthly(month);
            let prev = month.prev().map(data::monthly);
            TrendItem {
                month,
                receita: f.receita,
                lucro: f.lucro,
                receita_delta: prev.and_then(|p| pct_delta(f.receita, p.receita)),
                lucro_delta: prev.and_then(|p| pct_delta(f.lucro, p.lucro)),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Insights and highlighted results
// ---------------------------------------------------------------------------

/// Static insights, most impactful first.
pub fn get_insights() -> Vec<Insight> {
    let mut insights = data::INSIGHTS.to_vec();
    insights.sort_by_key(|i| i.impact);
    insights
}

pub fn get_results() -> &'static [ResultItem] {
    data::RESULTS
}
