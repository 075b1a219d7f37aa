use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DreError, Result};
use crate::period::{PeriodConfig, Periodo};
use crate::task::{simulated_wait, SimulatedDelay, SingleFlight, WaitOutcome};

// ---------------------------------------------------------------------------
// Filter values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Brl,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Brl, Currency::Usd, Currency::Eur];

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Brl => "R$",
            Currency::Usd => "US$",
            Currency::Eur => "€",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(DreError::UnknownCurrency(s.to_string())),
        }
    }
}

/// Decimal places for full currency values. Serialized as a string ("2").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Precision(u8);

impl Precision {
    pub const MAX: u8 = 2;

    pub fn new(places: u8) -> Result<Self> {
        if places > Self::MAX {
            return Err(DreError::UnknownPrecision(places.to_string()));
        }
        Ok(Self(places))
    }

    pub fn places(&self) -> u8 {
        self.0
    }

    /// Cycle 0 -> 1 -> 2 -> 0.
    pub fn next(&self) -> Self {
        Self((self.0 + 1) % (Self::MAX + 1))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(2)
    }
}

impl FromStr for Precision {
    type Err = DreError;

    fn from_str(s: &str) -> Result<Self> {
        let places: u8 = s
            .trim()
            .parse()
            .map_err(|_| DreError::UnknownPrecision(s.to_string()))?;
        Precision::new(places)
    }
}

impl TryFrom<String> for Precision {
    type Error = DreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Precision> for String {
    fn from(p: Precision) -> String {
        p.0.to_string()
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filters {
    pub periodo: Periodo,
    pub moeda: Currency,
    pub precisao: Precision,
}

impl Filters {
    pub fn period(&self) -> PeriodConfig {
        self.periodo.resolve()
    }

    /// Full currency value honouring the precision filter.
    pub fn money(&self, val: f64) -> String {
        crate::fmt::currency(val, self.moeda, self.precisao.places())
    }

    /// Abbreviated chart label; ignores the precision filter.
    pub fn compact(&self, val: f64) -> String {
        crate::fmt::compact_currency(val, self.moeda)
    }
}

/// A partial update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub periodo: Option<Periodo>,
    pub moeda: Option<Currency>,
    pub precisao: Option<Precision>,
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        self.periodo.is_none() && self.moeda.is_none() && self.precisao.is_none()
    }

    fn apply(self, filters: &mut Filters) {
        if let Some(p) = self.periodo {
            filters.periodo = p;
        }
        if let Some(m) = self.moeda {
            filters.moeda = m;
        }
        if let Some(p) = self.precisao {
            filters.precisao = p;
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    Cancelled,
}

/// Observable holder of the current filters. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct FilterStore {
    tx: Arc<watch::Sender<Filters>>,
    refresh: SingleFlight,
    refresh_delay: SimulatedDelay,
    last_refreshed: Arc<Mutex<Option<DateTime<Local>>>>,
}

impl FilterStore {
    pub fn new(initial: Filters, refresh_delay: SimulatedDelay) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            refresh: SingleFlight::default(),
            refresh_delay,
            last_refreshed: Arc::new(Mutex::new(None)),
        }
    }

    pub fn filters(&self) -> Filters {
        self.tx.borrow().clone()
    }

    /// Change notifications for every later `update_filters`.
    pub fn subscribe(&self) -> watch::Receiver<Filters> {
        self.tx.subscribe()
    }

    /// Shallow-merge `patch` into the current filters and notify subscribers.
    pub fn update_filters(&self, patch: FilterPatch) {
        if patch.is_empty() {
            return;
        }
        debug!(?patch, "updating filters");
        self.tx.send_modify(|filters| patch.apply(filters));
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_busy()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed.lock().ok().and_then(|t| *t)
    }

    /// Simulated data reload. Rejects overlapping calls; `cancel` ends the wait early.
    pub async fn refresh_data(&self, cancel: CancellationToken) -> Result<RefreshOutcome> {
        let Some(_guard) = self.refresh.try_begin() else {
            warn!("refresh rejected: another refresh is in flight");
            return Err(DreError::RefreshInFlight);
        };
        info!(period = %self.filters().period().label(), "refresh started");
        match simulated_wait(self.refresh_delay, &cancel).await {
            WaitOutcome::Completed => {
                if let Ok(mut t) = self.last_refreshed.lock() {
                    *t = Some(Local::now());
                }
                info!("refresh finished");
                Ok(RefreshOutcome::Completed)
            }
            WaitOutcome::Cancelled => {
                info!("refresh cancelled");
                Ok(RefreshOutcome::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::period::MonthToken;

    fn store(delay_ms: u64) -> FilterStore {
        FilterStore::new(
            Filters::default(),
            SimulatedDelay::fixed(Duration::from_millis(delay_ms)),
        )
    }

    #[test]
    fn test_currency_and_precision_parsing() {
        assert_eq!("brl".parse::<Currency>().unwrap(), Currency::Brl);
        assert!("JPY".parse::<Currency>().is_err());
        assert_eq!("1".parse::<Precision>().unwrap().places(), 1);
        assert!("3".parse::<Precision>().is_err());
        assert!("x".parse::<Precision>().is_err());
        assert_eq!(Precision::new(2).unwrap().next().places(), 0);
    }

    #[test]
    fn test_filters_json_shape() {
        let json = serde_json::to_string(&Filters::default()).unwrap();
        assert_eq!(
            json,
            r#"{"periodo":{"mode":"month","month":"dezembro-2024"},"moeda":"BRL","precisao":"2"}"#
        );
        let legacy: Filters =
            serde_json::from_str(r#"{"periodo":"2024","moeda":"USD","precisao":"0"}"#).unwrap();
        assert_eq!(legacy.period().months().len(), 12);
        assert_eq!(legacy.moeda, Currency::Usd);
    }

    #[test]
    fn test_update_filters_is_shallow_merge() {
        let s = store(1);
        s.update_filters(FilterPatch {
            moeda: Some(Currency::Eur),
            ..FilterPatch::default()
        });
        let f = s.filters();
        assert_eq!(f.moeda, Currency::Eur);
        assert_eq!(f.precisao, Precision::default());
        assert_eq!(f.periodo, Periodo::default());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let s = store(1);
        let mut rx = s.subscribe();
        assert!(!rx.has_changed().unwrap());
        let month: MonthToken = "marco-2024".parse().unwrap();
        s.update_filters(FilterPatch {
            periodo: Some(Periodo::Config(PeriodConfig::Month { month })),
            ..FilterPatch::default()
        });
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().period(), PeriodConfig::Month { month });
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_empty_patch_does_not_notify() {
        let s = store(1);
        let rx = s.subscribe();
        s.update_filters(FilterPatch::default());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_refresh_sets_flag_and_timestamp() {
        let s = store(20);
        assert!(s.last_refreshed().is_none());
        let task = {
            let s = s.clone();
            tokio::spawn(async move { s.refresh_data(CancellationToken::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(s.is_refreshing());
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, RefreshOutcome::Completed);
        assert!(!s.is_refreshing());
        assert!(s.last_refreshed().is_some());
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_rejected() {
        let s = store(200);
        let cancel = CancellationToken::new();
        let first = {
            let s = s.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { s.refresh_data(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = s.refresh_data(CancellationToken::new()).await;
        assert!(matches!(second, Err(DreError::RefreshInFlight)));
        cancel.cancel();
        assert_eq!(first.await.unwrap().unwrap(), RefreshOutcome::Cancelled);
        assert!(!s.is_refreshing());
        assert!(s.last_refreshed().is_none());
    }
}
