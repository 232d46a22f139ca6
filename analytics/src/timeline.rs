//! Status counts over fixed-width time buckets.

use crate::status::{StatusCounts, counts_at};
use chrono::{DateTime, TimeDelta, Utc};
use kitchen_sim_core::order::OrderRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from [`status_over_time`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineError {
    /// Buckets must have a positive width
    #[error("Bucket width must be positive")]
    ZeroBucketWidth,

    /// The width does not fit the timestamp range
    #[error("Bucket width {0:?} is too large")]
    BucketWidthTooLarge(Duration),
}

/// Status counts sampled at the start of one bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBucket {
    /// Bucket start, where the counts are taken
    pub start: DateTime<Utc>,
    /// Counts at `start`
    pub counts: StatusCounts,
}

fn latest_timestamp(record: &OrderRecord) -> DateTime<Utc> {
    [Some(record.received_at), record.started_at, record.completed_at]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(record.received_at)
}

/// Sample [`counts_at`] at every bucket start.
///
/// Buckets begin at the earliest `received_at` and step by `bucket_width`
/// through the bucket containing the latest timestamp of any kind. No
/// records means no buckets.
///
/// # Errors
///
/// Returns [`TimelineError::ZeroBucketWidth`] for a zero width and
/// [`TimelineError::BucketWidthTooLarge`] for one chrono cannot represent.
pub fn status_over_time(
    records: &[OrderRecord],
    bucket_width: Duration,
) -> Result<Vec<StatusBucket>, TimelineError> {
    if bucket_width.is_zero() {
        return Err(TimelineError::ZeroBucketWidth);
    }
    let step = TimeDelta::from_std(bucket_width)
        .map_err(|_| TimelineError::BucketWidthTooLarge(bucket_width))?;

    let Some(first) = records.iter().map(|r| r.received_at).min() else {
        return Ok(Vec::new());
    };
    let last = records.iter().map(latest_timestamp).max().unwrap_or(first);

    let mut buckets = Vec::new();
    let mut start = first;
    while start <= last {
        buckets.push(StatusBucket {
            start,
            counts: counts_at(records, start),
        });
        match start.checked_add_signed(step) {
            Some(next) => start = next,
            None => break,
        }
    }
    Ok(buckets)
}
