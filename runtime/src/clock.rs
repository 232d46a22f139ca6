//! Virtual clock and wall-clock pacing.
//!
//! The [`VirtualClock`] is the single source of "now" during a run. Only the
//! executor moves it, and only forward, to the time of the event it is about
//! to process. [`Pacing`] decides whether the executor waits in real time
//! before doing so.

use crate::error::SimulationError;
use chrono::{DateTime, Utc};
use kitchen_sim_core::environment::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Shared, monotonically non-decreasing virtual clock.
///
/// Cloning yields a handle to the same clock, so the executor can advance it
/// while reducers read it through `Arc<dyn Clock>`.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    millis: Arc<AtomicI64>,
}

impl VirtualClock {
    /// Create a clock reading `origin`
    #[must_use]
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(origin.timestamp_millis())),
        }
    }

    /// Move the clock to `at`. Earlier times are ignored.
    pub fn advance_to(&self, at: DateTime<Utc>) {
        self.millis.fetch_max(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// How virtual time relates to wall-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// Jump straight to the next event with no real latency
    Instant,
    /// Wall time elapsed ≈ virtual time elapsed / `speed`
    RealTime {
        /// 1.0 is real time, 2.0 twice as fast
        speed: f64,
    },
}

impl Pacing {
    /// Real-time pacing at `speed`
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidSpeed`] unless `speed` is positive and finite.
    pub fn real_time(speed: f64) -> Result<Self, SimulationError> {
        if speed.is_finite() && speed > 0.0 {
            Ok(Self::RealTime { speed })
        } else {
            Err(SimulationError::InvalidSpeed(speed))
        }
    }
}

/// Sleeps the executor so virtual time tracks wall time.
///
/// Pacing is not strict: when the executor is already behind schedule it
/// proceeds immediately instead of failing.
#[derive(Debug)]
pub(crate) struct Pacer {
    pacing: Pacing,
    origin: DateTime<Utc>,
    anchor: Option<Instant>,
}

impl Pacer {
    pub(crate) const fn new(pacing: Pacing, origin: DateTime<Utc>) -> Self {
        Self {
            pacing,
            origin,
            anchor: None,
        }
    }

    /// Pin the wall-clock instant that corresponds to the virtual origin.
    pub(crate) fn start(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(Instant::now());
        }
    }

    /// Wall-clock offset from the anchor at which `at` should be processed.
    ///
    /// Saturates at [`Duration::MAX`] when a very slow speed stretches the
    /// offset past what a `Duration` can hold.
    pub(crate) fn wall_offset(&self, at: DateTime<Utc>) -> Option<Duration> {
        match self.pacing {
            Pacing::Instant => None,
            Pacing::RealTime { speed } => {
                let virtual_elapsed = (at - self.origin).to_std().unwrap_or_default();
                let wall_secs = virtual_elapsed.as_secs_f64() / speed;
                Some(Duration::try_from_secs_f64(wall_secs).unwrap_or(Duration::MAX))
            },
        }
    }

    pub(crate) async fn wait_until(&mut self, at: DateTime<Utc>) {
        let Some(offset) = self.wall_offset(at) else {
            return;
        };
        self.start();
        let Some(anchor) = self.anchor else {
            return;
        };
        match anchor.checked_add(offset) {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            // Past the end of representable time; tokio caps this sleep itself.
            None => tokio::time::sleep(Duration::MAX).await,
        }
    }
}
