use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DreError, Result};

/// Token spellings, in calendar order. Tokens are ASCII-only (`marco`).
const MONTH_SLUGS: &[&str] = &[
    "janeiro", "fevereiro", "marco", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

pub const MONTH_LABELS: &[&str] = &[
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho",
    "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro",
];

pub const MONTH_ABBREV: &[&str] = &[
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Years covered by the reporting dataset.
pub const FIRST_YEAR: i32 = 2023;
pub const LAST_YEAR: i32 = 2024;

/// A year-month from the fixed reporting calendar, spelled `dezembro-2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthToken {
    year: i32,
    month: u32,
}

impl MonthToken {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return Err(DreError::UnknownMonth(format!("{year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Every token of the reporting calendar, oldest first.
    pub fn all() -> impl Iterator<Item = MonthToken> {
        (FIRST_YEAR..=LAST_YEAR).flat_map(|year| (1..=12).map(move |month| MonthToken { year, month }))
    }

    pub fn first() -> Self {
        Self { year: FIRST_YEAR, month: 1 }
    }

    pub fn last() -> Self {
        Self { year: LAST_YEAR, month: 12 }
    }

    /// Previous month, or `None` at the start of the calendar.
    pub fn prev(&self) -> Option<Self> {
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        Self::new(year, month).ok()
    }

    pub fn next(&self) -> Option<Self> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Self::new(year, month).ok()
    }

    /// Position in the calendar (0 = janeiro of the first year).
    pub fn index(&self) -> usize {
        ((self.year - FIRST_YEAR) * 12 + self.month as i32 - 1) as usize
    }

    /// "Dezembro 2024"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_LABELS[(self.month - 1) as usize], self.year)
    }

    /// "Dez/24"
    pub fn short_label(&self) -> String {
        format!("{}/{:02}", MONTH_ABBREV[(self.month - 1) as usize], self.year % 100)
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", MONTH_SLUGS[(self.month - 1) as usize], self.year)
    }
}

impl FromStr for MonthToken {
    type Err = DreError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let (name, year) = lower
            .rsplit_once('-')
            .ok_or_else(|| DreError::UnknownMonth(s.to_string()))?;
        let name = if name == "março" { "marco" } else { name };
        let month = MONTH_SLUGS
            .iter()
            .position(|m| *m == name)
            .ok_or_else(|| DreError::UnknownMonth(s.to_string()))?;
        let year: i32 = year.parse().map_err(|_| DreError::UnknownMonth(s.to_string()))?;
        MonthToken::new(year, month as u32 + 1).map_err(|_| DreError::UnknownMonth(s.to_string()))
    }
}

impl TryFrom<String> for MonthToken {
    type Error = DreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<MonthToken> for String {
    fn from(t: MonthToken) -> String {
        t.to_string()
    }
}

/// Default reporting month.
pub fn default_month() -> MonthToken {
    MonthToken { year: 2024, month: 12 }
}

/// Bounds seeded when switching to range mode without prior values.
pub fn default_range() -> (MonthToken, MonthToken) {
    (MonthToken { year: 2024, month: 1 }, MonthToken { year: 2024, month: 12 })
}

// ---------------------------------------------------------------------------
// Period configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMode {
    Month,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PeriodConfig {
    Month {
        month: MonthToken,
    },
    Range {
        #[serde(rename = "startMonth")]
        start_month: MonthToken,
        #[serde(rename = "endMonth")]
        end_month: MonthToken,
    },
}

impl Default for PeriodConfig {
    fn default() -> Self {
        PeriodConfig::Month { month: default_month() }
    }
}

impl PeriodConfig {
    pub fn mode(&self) -> PeriodMode {
        match self {
            PeriodConfig::Month { .. } => PeriodMode::Month,
            PeriodConfig::Range { .. } => PeriodMode::Range,
        }
    }

    /// Range bounds are kept exactly as entered, so `start > end` is possible.
    pub fn is_inverted(&self) -> bool {
        matches!(self, PeriodConfig::Range { start_month, end_month } if start_month > end_month)
    }

    /// Months covered by the period, oldest first. Empty for an inverted range.
    pub fn months(&self) -> Vec<MonthToken> {
        match *self {
            PeriodConfig::Month { month } => vec![month],
            PeriodConfig::Range { start_month, end_month } => MonthToken::all()
                .filter(|m| *m >= start_month && *m <= end_month)
                .collect(),
        }
    }

    /// The period of equal length immediately before this one. Empty when the
    /// calendar cannot supply a full period of the same length.
    pub fn previous_months(&self) -> Vec<MonthToken> {
        let months = self.months();
        let Some(first) = months.first() else {
            return Vec::new();
        };
        let mut prev = Vec::with_capacity(months.len());
        let mut cursor = first.prev();
        while let Some(m) = cursor {
            if prev.len() == months.len() {
                break;
            }
            prev.push(m);
            cursor = m.prev();
        }
        if prev.len() < months.len() {
            return Vec::new();
        }
        prev.reverse();
        prev
    }

    /// The last month of the period (the end bound for ranges).
    pub fn anchor(&self) -> MonthToken {
        match *self {
            PeriodConfig::Month { month } => month,
            PeriodConfig::Range { end_month, .. } => end_month,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PeriodConfig::Month { month } => month.label(),
            PeriodConfig::Range { start_month, end_month } => {
                format!("{} a {}", start_month.label(), end_month.label())
            }
        }
    }

    /// File-name friendly slug: `dezembro-2024`, `janeiro-2024_dezembro-2024`.
    pub fn slug(&self) -> String {
        match self {
            PeriodConfig::Month { month } => month.to_string(),
            PeriodConfig::Range { start_month, end_month } => format!("{start_month}_{end_month}"),
        }
    }

    /// Interpret a pre-`PeriodConfig` period string. Month tokens map to month
    /// mode, a bare year to that full year, anything else to the default month.
    pub fn from_legacy(value: &str) -> Self {
        if let Ok(month) = value.parse::<MonthToken>() {
            return PeriodConfig::Month { month };
        }
        if let Ok(year) = value.trim().parse::<i32>() {
            if let (Ok(start_month), Ok(end_month)) = (MonthToken::new(year, 1), MonthToken::new(year, 12)) {
                return PeriodConfig::Range { start_month, end_month };
            }
        }
        PeriodConfig::default()
    }
}

/// The `periodo` filter value: a structured configuration or a legacy string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Periodo {
    Config(PeriodConfig),
    Legacy(String),
}

impl Default for Periodo {
    fn default() -> Self {
        Periodo::Config(PeriodConfig::default())
    }
}

impl Periodo {
    pub fn resolve(&self) -> PeriodConfig {
        match self {
            Periodo::Config(c) => *c,
            Periodo::Legacy(s) => PeriodConfig::from_legacy(s),
        }
    }
}

impl From<PeriodConfig> for Periodo {
    fn from(c: PeriodConfig) -> Self {
        Periodo::Config(c)
    }
}

// ---------------------------------------------------------------------------
// Period selector state machine
// ---------------------------------------------------------------------------

/// Two-state selector (month / range). Values entered in one mode survive a
/// round trip through the other.
#[derive(Debug, Clone)]
pub struct PeriodSelector {
    mode: PeriodMode,
    month: Option<MonthToken>,
    start_month: Option<MonthToken>,
    end_month: Option<MonthToken>,
}

impl PeriodSelector {
    pub fn new(config: PeriodConfig) -> Self {
        match config {
            PeriodConfig::Month { month } => Self {
                mode: PeriodMode::Month,
                month: Some(month),
                start_month: None,
                end_month: None,
            },
            PeriodConfig::Range { start_month, end_month } => Self {
                mode: PeriodMode::Range,
                month: None,
                start_month: Some(start_month),
                end_month: Some(end_month),
            },
        }
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn config(&self) -> PeriodConfig {
        match self.mode {
            PeriodMode::Month => PeriodConfig::Month {
                month: self.month.unwrap_or_else(default_month),
            },
            PeriodMode::Range => {
                let (default_start, default_end) = default_range();
                PeriodConfig::Range {
                    start_month: self.start_month.unwrap_or(default_start),
                    end_month: self.end_month.unwrap_or(default_end),
                }
            }
        }
    }

    /// Switch modes, seeding defaults for bounds never entered.
    pub fn handle_mode_change(&mut self, mode: PeriodMode) -> PeriodConfig {
        if mode != self.mode {
            match mode {
                PeriodMode::Range => {
                    let (default_start, default_end) = default_range();
                    self.start_month.get_or_insert(default_start);
                    self.end_month.get_or_insert(default_end);
                }
                PeriodMode::Month => {
                    self.month.get_or_insert_with(default_month);
                }
            }
            self.mode = mode;
        }
        self.config()
    }

    pub fn toggle_mode(&mut self) -> PeriodConfig {
        let next = match self.mode {
            PeriodMode::Month => PeriodMode::Range,
            PeriodMode::Range => PeriodMode::Month,
        };
        self.handle_mode_change(next)
    }

    pub fn set_month(&mut self, month: MonthToken) -> PeriodConfig {
        self.month = Some(month);
        self.config()
    }

    pub fn set_start_month(&mut self, month: MonthToken) -> PeriodConfig {
        self.start_month = Some(month);
        self.config()
    }

    pub fn set_end_month(&mut self, month: MonthToken) -> PeriodConfig {
        self.end_month = Some(month);
        self.config()
    }
}
