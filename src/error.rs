use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum DreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown month: {0} (expected e.g. dezembro-2024)")]
    UnknownMonth(String),

    #[error("Unknown currency: {0} (expected BRL, USD or EUR)")]
    UnknownCurrency(String),

    #[error("Unknown precision: {0} (expected 0, 1 or 2)")]
    UnknownPrecision(String),

    #[error("Unknown export format: {0} (expected text, csv or json)")]
    UnknownFormat(String),

    #[error("A refresh is already in progress")]
    RefreshInFlight,

    #[error("An export is already in progress")]
    ExportInFlight,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl DreError {
    /// Background task failures (join errors) carry no useful type of their own.
    pub fn task(e: impl std::fmt::Display) -> Self {
        DreError::Other(format!("Background task failed: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, DreError>;
