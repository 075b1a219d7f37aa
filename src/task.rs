use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// At most one holder at a time. A second `try_begin` while a guard is alive
/// is refused rather than queued.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

/// Releases the flight when dropped, including on cancellation or panic.
#[derive(Debug)]
pub struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn try_begin(&self) -> Option<FlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A fixed base delay plus up to `jitter` of random extra time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedDelay {
    pub base: Duration,
    pub jitter: Duration,
}

impl SimulatedDelay {
    pub fn fixed(base: Duration) -> Self {
        Self {
            base,
            jitter: Duration::ZERO,
        }
    }

    pub fn sample(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.base + Duration::from_millis(extra)
    }
}

/// Whether a simulated wait ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

/// Sleep for the sampled delay unless `cancel` fires first.
pub async fn simulated_wait(delay: SimulatedDelay, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(delay.sample()) => WaitOutcome::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight_rejects_second_holder() {
        let flight = SingleFlight::default();
        let guard = flight.try_begin();
        assert!(guard.is_some());
        assert!(flight.is_busy());
        assert!(flight.try_begin().is_none());
        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_begin().is_some());
    }

    #[test]
    fn test_delay_sample_within_bounds() {
        let d = SimulatedDelay {
            base: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
        };
        for _ in 0..20 {
            let s = d.sample();
            assert!(s >= Duration::from_millis(100) && s <= Duration::from_millis(150));
        }
        assert_eq!(SimulatedDelay::fixed(Duration::from_millis(7)).sample(), Duration::from_millis(7));
    }

    #[tokio::test]
    async fn test_wait_cancelled_early() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = simulated_wait(SimulatedDelay::fixed(Duration::from_secs(30)), &cancel).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_wait_completes() {
        let cancel = CancellationToken::new();
        let outcome = simulated_wait(SimulatedDelay::fixed(Duration::from_millis(1)), &cancel).await;
        assert_eq!(outcome, WaitOutcome::Completed);
    }
}
