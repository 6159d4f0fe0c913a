//! Per-client exchange counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters shared by every handle to a client.
#[derive(Default)]
pub struct Stats {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    elapsed_micros: AtomicU64,
}

impl Stats {
    pub(crate) fn record(&self, outcome_ok: bool, elapsed: Option<Duration>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if outcome_ok {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(elapsed) = elapsed {
            let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
            self.elapsed_micros.fetch_add(micros, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_elapsed: Duration::from_micros(self.elapsed_micros.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time view of a client's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_elapsed: Duration,
}
