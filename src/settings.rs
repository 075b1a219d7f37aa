use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DreError, Result};
use crate::filters::{Currency, Filters, Precision};
use crate::period::{default_month, MonthToken, PeriodConfig, Periodo};
use crate::responsive::Breakpoints;
use crate::task::SimulatedDelay;

/// Overrides the configuration directory (tests, multiple profiles).
pub const CONFIG_DIR_ENV: &str = "DRE_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub default_currency: Currency,
    #[serde(default)]
    pub default_precision: Precision,
    #[serde(default = "default_month")]
    pub default_month: MonthToken,
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
    #[serde(default = "default_refresh_jitter_ms")]
    pub refresh_jitter_ms: u64,
    #[serde(default = "default_export_delay_ms")]
    pub export_delay_ms: u64,
    #[serde(default)]
    pub breakpoints: Breakpoints,
    #[serde(default = "default_cell_width_px")]
    pub cell_width_px: u16,
    #[serde(default = "default_cell_height_px")]
    pub cell_height_px: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

fn default_company_name() -> String {
    "Minha Empresa".to_string()
}

fn default_refresh_delay_ms() -> u64 {
    800
}

fn default_refresh_jitter_ms() -> u64 {
    400
}

fn default_export_delay_ms() -> u64 {
    1500
}

fn default_cell_width_px() -> u16 {
    8
}

fn default_cell_height_px() -> u16 {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            company_name: default_company_name(),
            user_name: String::new(),
            default_currency: Currency::default(),
            default_precision: Precision::default(),
            default_month: default_month(),
            refresh_delay_ms: default_refresh_delay_ms(),
            refresh_jitter_ms: default_refresh_jitter_ms(),
            export_delay_ms: default_export_delay_ms(),
            breakpoints: Breakpoints::default(),
            cell_width_px: default_cell_width_px(),
            cell_height_px: default_cell_height_px(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Filters the dashboard and CLI start from.
    pub fn initial_filters(&self) -> Filters {
        Filters {
            periodo: Periodo::Config(PeriodConfig::Month {
                month: self.default_month,
            }),
            moeda: self.default_currency,
            precisao: self.default_precision,
        }
    }

    pub fn refresh_delay(&self) -> SimulatedDelay {
        SimulatedDelay {
            base: Duration::from_millis(self.refresh_delay_ms),
            jitter: Duration::from_millis(self.refresh_jitter_ms),
        }
    }

    pub fn export_delay(&self) -> SimulatedDelay {
        SimulatedDelay::fixed(Duration::from_millis(self.export_delay_ms))
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dre")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("dre")
}

/// Missing or unreadable files yield defaults; partial files merge with them.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json =
        serde_json::to_string_pretty(settings).map_err(|e| DreError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            company_name: "Horizonte".to_string(),
            default_currency: Currency::Usd,
            default_precision: "0".parse().unwrap(),
            default_month: "marco-2024".parse().unwrap(),
            ..Settings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.company_name, "Horizonte");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.default_currency, Currency::Usd);
        assert_eq!(loaded.default_precision.places(), 0);
        assert_eq!(loaded.default_month.to_string(), "marco-2024");
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("absent.json"));
        assert!(s.user_name.is_empty());
        assert_eq!(s.default_month, default_month());
        assert_eq!(s.default_currency, Currency::Brl);
        assert_eq!(s.breakpoints, Breakpoints::default());
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "default_currency": "EUR", "breakpoints": {"sm": 500, "md": 700, "lg": 900, "xl": 1100, "2xl": 1300}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.default_currency, Currency::Eur);
        assert_eq!(s.breakpoints.lg, 900);
        assert_eq!(s.refresh_delay_ms, 800);
        assert_eq!(s.cell_width_px, 8);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path).company_name, "Minha Empresa");
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_settings_to(&path, &Settings::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_initial_filters_follow_defaults() {
        let settings = Settings {
            default_currency: Currency::Eur,
            default_month: "junho-2023".parse().unwrap(),
            ..Settings::default()
        };
        let f = settings.initial_filters();
        assert_eq!(f.moeda, Currency::Eur);
        assert_eq!(f.period().label(), "Junho 2023");
    }
}
