mod admin;
mod cli;
mod data;
mod error;
mod export;
mod filters;
mod fmt;
mod logging;
mod models;
mod notify;
mod period;
mod reports;
mod responsive;
mod settings;
mod task;
mod tui;
mod validation;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands, ValidateCommands};
use export::ExportOptions;
use settings::{load_settings, Settings};

/// Log to `<data_dir>/dre.log`; a failure here never stops the command.
fn init_logging(settings: &Settings) {
    if let Err(e) = logging::init(settings) {
        eprintln!("Logging disabled: {e}");
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => {
            let settings = load_settings();
            init_logging(&settings);
            cli::dashboard::run(&settings)
        }
        Commands::Report { view, filters } => filters
            .resolve(&load_settings())
            .and_then(|f| cli::report::run(view, &f)),
        Commands::Export {
            format,
            output,
            no_summary,
            no_statement,
            no_waterfall,
            no_expenses,
            no_insights,
            filters,
        } => {
            let settings = load_settings();
            init_logging(&settings);
            let options = ExportOptions {
                include_summary: !no_summary,
                include_statement: !no_statement,
                include_waterfall: !no_waterfall,
                include_expenses: !no_expenses,
                include_insights: !no_insights,
            };
            filters
                .resolve(&settings)
                .and_then(|f| cli::export::run(&format, output, options, f, &settings))
        }
        Commands::Validate { command } => match command {
            ValidateCommands::Cnpj { value } => cli::validate::cnpj(&value),
            ValidateCommands::Email { value } => cli::validate::email(&value),
        },
        Commands::Layout { width, height } => cli::layout::run(width, height),
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "dre", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
