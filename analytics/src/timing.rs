//! Queue wait and turnaround statistics.

use kitchen_sim_core::order::OrderRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing statistics over completed orders
///
/// Queue wait is `started_at − received_at`; turnaround is
/// `completed_at − received_at`. All durations are `None` when no order has
/// completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// Orders the statistics are computed over
    pub completed_orders: usize,
    /// Mean time from arrival to first cook grant
    pub mean_queue_wait: Option<Duration>,
    /// Longest time from arrival to first cook grant
    pub max_queue_wait: Option<Duration>,
    /// Mean time from arrival to completion
    pub mean_turnaround: Option<Duration>,
    /// Longest time from arrival to completion
    pub max_turnaround: Option<Duration>,
}

fn mean(total: Duration, count: usize) -> Option<Duration> {
    let count = u32::try_from(count).ok().filter(|&n| n > 0)?;
    Some(total / count)
}

/// Summarise queue waits and turnarounds of completed orders
#[must_use]
pub fn timing_summary(records: &[OrderRecord]) -> TimingSummary {
    let samples: Vec<(Duration, Duration)> = records
        .iter()
        .filter_map(|record| {
            let started = record.started_at?;
            let completed = record.completed_at?;
            let wait = (started - record.received_at).to_std().unwrap_or_default();
            let turnaround = (completed - record.received_at).to_std().unwrap_or_default();
            Some((wait, turnaround))
        })
        .collect();

    let completed_orders = samples.len();
    TimingSummary {
        completed_orders,
        mean_queue_wait: mean(samples.iter().map(|(w, _)| *w).sum(), completed_orders),
        max_queue_wait: samples.iter().map(|(w, _)| *w).max(),
        mean_turnaround: mean(samples.iter().map(|(_, t)| *t).sum(), completed_orders),
        max_turnaround: samples.iter().map(|(_, t)| *t).max(),
    }
}
