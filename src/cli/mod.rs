pub mod admin;
pub mod charts;
pub mod dashboard;
pub mod export;
pub mod init;
pub mod layout;
pub mod report;
pub mod validate;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::{DreError, Result};
use crate::filters::Filters;
use crate::period::{MonthToken, PeriodConfig, Periodo};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "dre", about = "Income-statement (DRE) dashboard and admin console for the terminal.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (default).
    Dashboard,
    /// Print a report as a plain-text table.
    Report {
        /// Which report to print
        #[arg(value_enum)]
        view: ReportView,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export the dashboard to a text, CSV or JSON file.
    Export {
        /// Output format: text, csv (excel) or json
        #[arg(long, default_value = "text")]
        format: String,
        /// Output path (default: <data_dir>/exports/dre-<period>-<date>.<ext>)
        #[arg(long)]
        output: Option<String>,
        #[arg(long = "no-summary")]
        no_summary: bool,
        #[arg(long = "no-statement")]
        no_statement: bool,
        #[arg(long = "no-waterfall")]
        no_waterfall: bool,
        #[arg(long = "no-expenses")]
        no_expenses: bool,
        #[arg(long = "no-insights")]
        no_insights: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Check a CNPJ or e-mail address the way the admin forms do.
    Validate {
        #[command(subcommand)]
        command: ValidateCommands,
    },
    /// Show the responsive layout flags for a viewport size in pixels.
    Layout {
        width: u32,
        height: Option<u32>,
    },
    /// Write default settings and create the data directory.
    Init {
        /// Path for DRE data (default: ~/Documents/dre)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportView {
    Summary,
    Statement,
    Waterfall,
    Expenses,
    Trends,
    Insights,
    Results,
}

#[derive(Subcommand)]
pub enum ValidateCommands {
    /// Validate a CNPJ (14 digits, punctuation ignored).
    Cnpj { value: String },
    /// Validate an e-mail address.
    Email { value: String },
}

/// Period, currency and precision flags shared by `report` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Month token, e.g. dezembro-2024, or a year for the whole year
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<String>,
    /// Range start month, e.g. janeiro-2024
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// Range end month, e.g. junho-2024
    #[arg(long, requires = "from")]
    pub to: Option<String>,
    /// BRL, USD or EUR
    #[arg(long)]
    pub currency: Option<String>,
    /// Decimal places: 0, 1 or 2
    #[arg(long)]
    pub precision: Option<String>,
}

impl FilterArgs {
    /// Overlay the flags on the configured defaults.
    pub fn resolve(&self, settings: &Settings) -> Result<Filters> {
        let mut filters = settings.initial_filters();
        if let Some(month) = &self.month {
            filters.periodo = Periodo::Config(parse_month_arg(month)?);
        }
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            filters.periodo = Periodo::Config(PeriodConfig::Range {
                start_month: from.parse()?,
                end_month: to.parse()?,
            });
        }
        if let Some(currency) = &self.currency {
            filters.moeda = currency.parse()?;
        }
        if let Some(precision) = &self.precision {
            filters.precisao = precision.parse()?;
        }
        Ok(filters)
    }
}

/// A month token, or a bare year covering January to December.
fn parse_month_arg(value: &str) -> Result<PeriodConfig> {
    if let Ok(month) = value.parse::<MonthToken>() {
        return Ok(PeriodConfig::Month { month });
    }
    let trimmed = value.trim();
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = trimmed
            .parse()
            .map_err(|_| DreError::UnknownMonth(value.to_string()))?;
        if MonthToken::new(year, 1).is_ok() {
            return Ok(PeriodConfig::from_legacy(trimmed));
        }
    }
    Err(DreError::UnknownMonth(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Currency;

    #[test]
    fn test_resolve_without_flags_uses_settings() {
        let settings = Settings {
            default_currency: Currency::Usd,
            ..Settings::default()
        };
        let f = FilterArgs::default().resolve(&settings).unwrap();
        assert_eq!(f, settings.initial_filters());
    }

    #[test]
    fn test_resolve_month_and_currency() {
        let args = FilterArgs {
            month: Some("marco-2024".into()),
            currency: Some("eur".into()),
            precision: Some("0".into()),
            ..FilterArgs::default()
        };
        let f = args.resolve(&Settings::default()).unwrap();
        assert_eq!(f.period().label(), "Março 2024");
        assert_eq!(f.moeda, Currency::Eur);
        assert_eq!(f.precisao.places(), 0);
    }

    #[test]
    fn test_resolve_range_keeps_inverted_bounds() {
        let args = FilterArgs {
            from: Some("junho-2024".into()),
            to: Some("janeiro-2024".into()),
            ..FilterArgs::default()
        };
        let period = args.resolve(&Settings::default()).unwrap().period();
        assert!(period.is_inverted());
        assert!(period.months().is_empty());
    }

    #[test]
    fn test_month_flag_accepts_year() {
        let period = parse_month_arg("2023").unwrap();
        assert_eq!(period.months().len(), 12);
        assert!(matches!(parse_month_arg("1999"), Err(DreError::UnknownMonth(_))));
        assert!(matches!(parse_month_arg("smarch-2024"), Err(DreError::UnknownMonth(_))));
    }

    #[test]
    fn test_bad_currency_is_an_error() {
        let args = FilterArgs {
            currency: Some("GBP".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(
            args.resolve(&Settings::default()),
            Err(DreError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_cli_parses_report_flags() {
        let cli = Cli::try_parse_from(["dre", "report", "statement", "--from", "janeiro-2024", "--to", "marco-2024"]).unwrap();
        match cli.command {
            Some(Commands::Report { view, filters }) => {
                assert_eq!(view, ReportView::Statement);
                assert_eq!(filters.from.as_deref(), Some("janeiro-2024"));
            }
            _ => panic!("expected report command"),
        }
        assert!(Cli::try_parse_from(["dre", "report", "summary", "--month", "2024", "--from", "janeiro-2024"]).is_err());
    }
}
