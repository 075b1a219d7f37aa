use std::fmt;
use std::str::FromStr;

use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{DreError, Result};
use crate::filters::Filters;
use crate::fmt::percent;
use crate::models::Insight;
use crate::reports::{self, ExpenseSlice, MetricCard, Statement, Waterfall};
use crate::task::{simulated_wait, SimulatedDelay, SingleFlight, WaitOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Text, ExportFormat::Csv, ExportFormat::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Text => "Texto",
            ExportFormat::Csv => "CSV (Excel)",
            ExportFormat::Json => "JSON",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = DreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" | "excel" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(DreError::UnknownFormat(s.to_string())),
        }
    }
}

/// Sections included in an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_summary: bool,
    pub include_statement: bool,
    pub include_waterfall: bool,
    pub include_expenses: bool,
    pub include_insights: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_statement: true,
            include_waterfall: true,
            include_expenses: true,
            include_insights: true,
        }
    }
}

impl ExportOptions {
    pub fn is_empty(&self) -> bool {
        !(self.include_summary
            || self.include_statement
            || self.include_waterfall
            || self.include_expenses
            || self.include_insights)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub content: String,
}

/// Everything a rendered document contains, already filtered by the options.
#[derive(Serialize)]
struct Payload<'a> {
    company: &'a str,
    period: String,
    currency: &'static str,
    precision: u8,
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Vec<MetricCard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statement: Option<Statement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    waterfall: Option<Waterfall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expenses: Option<Vec<ExpenseSlice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insights: Option<Vec<Insight>>,
}

impl<'a> Payload<'a> {
    fn build(options: &ExportOptions, filters: &Filters, company: &'a str) -> Self {
        Self {
            company,
            period: filters.period().label(),
            currency: filters.moeda.code(),
            precision: filters.precisao.places(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            summary: options
                .include_summary
                .then(|| reports::get_metrics(filters)),
            statement: options
                .include_statement
                .then(|| reports::get_statement(filters)),
            waterfall: options
                .include_waterfall
                .then(|| reports::get_waterfall(filters)),
            expenses: options
                .include_expenses
                .then(|| reports::get_expense_breakdown(filters)),
            insights: options.include_insights.then(reports::get_insights),
        }
    }
}

fn render_text(p: &Payload, filters: &Filters) -> String {
    let mut out = format!(
        "DRE Analytics - {}\nPeríodo: {}\nMoeda: {}  Precisão: {}\nGerado em: {}\n",
        p.company, p.period, p.currency, p.precision, p.generated_at
    );

    let section = |out: &mut String, title: &str, table: Table| {
        out.push_str(&format!("\n{title}\n{table}\n"));
    };

    if let Some(cards) = &p.summary {
        let mut table = Table::new();
        table.set_header(vec!["Indicador", "Valor", "Variação"]);
        for card in cards {
            table.add_row(vec![
                Cell::new(card.title),
                Cell::new(card.display_value(filters)).set_alignment(CellAlignment::Right),
                Cell::new(card.display_delta()).set_alignment(CellAlignment::Right),
            ]);
        }
        section(&mut out, "Resumo", table);
    }

    if let Some(statement) = &p.statement {
        let mut table = Table::new();
        table.set_header(vec!["Conta", "Valor", "AV %"]);
        for line in &statement.lines {
            table.add_row(vec![
                Cell::new(line.label),
                Cell::new(filters.money(line.value)).set_alignment(CellAlignment::Right),
                Cell::new(line.vertical_pct.map(|v| percent(v, 1)).unwrap_or_default())
                    .set_alignment(CellAlignment::Right),
            ]);
        }
        section(&mut out, "Demonstrativo de Resultado", table);
    }

    if let Some(waterfall) = &p.waterfall {
        let mut table = Table::new();
        table.set_header(vec!["Etapa", "Variação", "Acumulado"]);
        for step in &waterfall.steps {
            table.add_row(vec![
                Cell::new(step.label),
                Cell::new(filters.money(step.delta)).set_alignment(CellAlignment::Right),
                Cell::new(filters.money(step.end)).set_alignment(CellAlignment::Right),
            ]);
        }
        section(&mut out, "Cascata do Resultado", table);
    }

    if let Some(slices) = &p.expenses {
        let mut table = Table::new();
        table.set_header(vec!["Categoria", "Valor", "%"]);
        for slice in slices {
            table.add_row(vec![
                Cell::new(slice.category.label()),
                Cell::new(filters.money(slice.value)).set_alignment(CellAlignment::Right),
                Cell::new(percent(slice.percent, 0)).set_alignment(CellAlignment::Right),
            ]);
        }
        section(&mut out, "Composição das Despesas", table);
    }

    if let Some(insights) = &p.insights {
        out.push_str("\nInsights\n");
        for insight in insights {
            out.push_str(&format!(
                "- [{}] {} ({}): {}\n",
                insight.impact.label(),
                insight.title,
                insight.kind.label(),
                insight.description
            ));
        }
    }

    out
}

fn render_csv(p: &Payload, filters: &Filters) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["secao", "item", "valor", "extra"])?;

    let places = filters.precisao.places() as usize;
    let num = |v: f64| format!("{v:.places$}");

    if let Some(cards) = &p.summary {
        for card in cards {
            let delta = card.delta.map(|d| format!("{d:.1}")).unwrap_or_default();
            wtr.write_record(["resumo", card.title, num(card.value).as_str(), delta.as_str()])?;
        }
    }
    if let Some(statement) = &p.statement {
        for line in &statement.lines {
            let av = line.vertical_pct.map(|v| format!("{v:.1}")).unwrap_or_default();
            wtr.write_record(["demonstrativo", line.label, num(line.value).as_str(), av.as_str()])?;
        }
    }
    if let Some(waterfall) = &p.waterfall {
        for step in &waterfall.steps {
            wtr.write_record([
                "cascata",
                step.label,
                num(step.delta).as_str(),
                num(step.end).as_str(),
            ])?;
        }
    }
    if let Some(slices) = &p.expenses {
        for slice in slices {
            let pct = format!("{:.0}", slice.percent);
            wtr.write_record([
                "despesas",
                slice.category.label(),
                num(slice.value).as_str(),
                pct.as_str(),
            ])?;
        }
    }
    if let Some(insights) = &p.insights {
        for insight in insights {
            wtr.write_record([
                "insights",
                insight.title,
                insight.value.unwrap_or(""),
                insight.impact.label(),
            ])?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| DreError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DreError::Other(e.to_string()))
}

/// Render the export payload for the current filters. No I/O.
pub fn render_document(
    format: ExportFormat,
    options: &ExportOptions,
    filters: &Filters,
    company: &str,
) -> Result<ExportDocument> {
    let payload = Payload::build(options, filters, company);
    let content = match format {
        ExportFormat::Text => render_text(&payload, filters),
        ExportFormat::Csv => render_csv(&payload, filters)?,
        ExportFormat::Json => serde_json::to_string_pretty(&payload)?,
    };
    let date = chrono::Local::now().format("%Y-%m-%d");
    Ok(ExportDocument {
        file_name: format!("dre-{}-{date}.{}", filters.period().slug(), format.extension()),
        content,
    })
}

// ---------------------------------------------------------------------------
// Export service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub options: ExportOptions,
    pub filters: Filters,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed(ExportDocument),
    Cancelled,
}

/// Runs one export at a time behind a simulated generation delay.
#[derive(Debug, Clone)]
pub struct ExportService {
    flight: SingleFlight,
    delay: SimulatedDelay,
}

impl ExportService {
    pub fn new(delay: SimulatedDelay) -> Self {
        Self {
            flight: SingleFlight::default(),
            delay,
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.flight.is_busy()
    }

    pub async fn export(
        &self,
        request: ExportRequest,
        cancel: CancellationToken,
    ) -> Result<ExportOutcome> {
        let Some(_guard) = self.flight.try_begin() else {
            warn!("export rejected: another export is in flight");
            return Err(DreError::ExportInFlight);
        };
        info!(format = %request.format, period = %request.filters.period().label(), "export started");
        match simulated_wait(self.delay, &cancel).await {
            WaitOutcome::Cancelled => {
                info!("export cancelled");
                Ok(ExportOutcome::Cancelled)
            }
            WaitOutcome::Completed => {
                let doc = render_document(
                    request.format,
                    &request.options,
                    &request.filters,
                    &request.company,
                )?;
                info!(file = %doc.file_name, bytes = doc.content.len(), "export finished");
                Ok(ExportOutcome::Completed(doc))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn request(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            format,
            options: ExportOptions::default(),
            filters: Filters::default(),
            company: "Horizonte".into(),
        }
    }

    #[test]
    fn test_format_aliases() {
        assert_eq!("TXT".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(DreError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_text_document_sections() {
        let doc = render_document(
            ExportFormat::Text,
            &ExportOptions::default(),
            &Filters::default(),
            "Horizonte",
        )
        .unwrap();
        assert!(doc.file_name.starts_with("dre-dezembro-2024-"));
        assert!(doc.file_name.ends_with(".txt"));
        assert!(doc.content.contains("DRE Analytics - Horizonte"));
        assert!(doc.content.contains("Período: Dezembro 2024"));
        assert!(doc.content.contains("R$ 1.450.000,00"));
        assert!(doc.content.contains("Lucro Líquido"));
        assert!(doc.content.contains("Composição das Despesas"));
    }

    #[test]
    fn test_excluded_sections_are_omitted() {
        let options = ExportOptions {
            include_statement: false,
            include_insights: false,
            ..ExportOptions::default()
        };
        let doc =
            render_document(ExportFormat::Text, &options, &Filters::default(), "X").unwrap();
        assert!(!doc.content.contains("Demonstrativo de Resultado"));
        assert!(!doc.content.contains("Insights"));
        assert!(doc.content.contains("Resumo"));
    }

    #[test]
    fn test_csv_rows() {
        let doc = render_document(
            ExportFormat::Csv,
            &ExportOptions::default(),
            &Filters::default(),
            "X",
        )
        .unwrap();
        let mut rdr = csv::Reader::from_reader(doc.content.as_bytes());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        let gross = rows
            .iter()
            .find(|r| &r[0] == "demonstrativo" && &r[1] == "Receita Bruta")
            .unwrap();
        assert_eq!(&gross[2], "1450000.00");
        assert_eq!(rows.iter().filter(|r| &r[0] == "cascata").count(), 5);
    }

    #[test]
    fn test_json_omits_disabled_sections() {
        let options = ExportOptions {
            include_waterfall: false,
            ..ExportOptions::default()
        };
        let doc =
            render_document(ExportFormat::Json, &options, &Filters::default(), "X").unwrap();
        let v: serde_json::Value = serde_json::from_str(&doc.content).unwrap();
        assert_eq!(v["currency"], "BRL");
        assert_eq!(v["statement"]["lines"].as_array().unwrap().len(), 9);
        assert!(v.get("waterfall").is_none());
    }

    #[tokio::test]
    async fn test_export_completes() {
        let service = ExportService::new(SimulatedDelay::fixed(Duration::from_millis(5)));
        let outcome = service
            .export(request(ExportFormat::Json), CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, ExportOutcome::Completed(d) if d.file_name.ends_with(".json")));
        assert!(!service.is_exporting());
    }

    #[tokio::test]
    async fn test_second_export_rejected_while_busy() {
        let service = ExportService::new(SimulatedDelay::fixed(Duration::from_millis(200)));
        let cancel = CancellationToken::new();
        let first = {
            let service = service.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { service.export(request(ExportFormat::Text), cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(service.is_exporting());
        let second = service
            .export(request(ExportFormat::Text), CancellationToken::new())
            .await;
        assert!(matches!(second, Err(DreError::ExportInFlight)));

        cancel.cancel();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, ExportOutcome::Cancelled);
        assert!(!service.is_exporting());
    }
}
