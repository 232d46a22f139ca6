//! Point-in-time status queries.

use chrono::{DateTime, Utc};
use kitchen_sim_core::order::{OrderRecord, OrderStatus};
use serde::{Deserialize, Serialize};

/// Number of orders in each status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Orders received but not started
    pub queued: usize,
    /// Orders started but not completed
    pub in_progress: usize,
    /// Orders completed
    pub completed: usize,
}

impl StatusCounts {
    /// Count one more order in `status`
    pub const fn add(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Queued => self.queued += 1,
            OrderStatus::InProgress => self.in_progress += 1,
            OrderStatus::Completed => self.completed += 1,
        }
    }

    /// Count for one status
    #[must_use]
    pub const fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Queued => self.queued,
            OrderStatus::InProgress => self.in_progress,
            OrderStatus::Completed => self.completed,
        }
    }

    /// Orders counted in any status
    #[must_use]
    pub const fn total(&self) -> usize {
        self.queued + self.in_progress + self.completed
    }
}

/// Status of `record` at instant `at`, or `None` if it had not arrived yet
#[must_use]
pub fn status_at(record: &OrderRecord, at: DateTime<Utc>) -> Option<OrderStatus> {
    if record.completed_at.is_some_and(|c| c <= at) {
        Some(OrderStatus::Completed)
    } else if record.started_at.is_some_and(|s| s <= at) {
        Some(OrderStatus::InProgress)
    } else if record.received_at <= at {
        Some(OrderStatus::Queued)
    } else {
        None
    }
}

/// Status counts at instant `at`
#[must_use]
pub fn counts_at(records: &[OrderRecord], at: DateTime<Utc>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for status in records.iter().filter_map(|record| status_at(record, at)) {
        counts.add(status);
    }
    counts
}

/// Counts by the stored `status` column
#[must_use]
pub fn orders_by_status(records: &[OrderRecord]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for record in records {
        counts.add(record.status);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitchen_sim_core::order::{NewOrderRecord, OrderRecord};
    use kitchen_sim_testing::fixtures::{at, item, order};

    fn record(received: i64, started: Option<i64>, completed: Option<i64>) -> OrderRecord {
        let mut record = OrderRecord::from(NewOrderRecord::from_order(
            &order(1, received, vec![item("Tea", 1)]),
            at(received),
        ));
        record.started_at = started.map(at);
        record.completed_at = completed.map(at);
        record.status = match (started, completed) {
            (_, Some(_)) => OrderStatus::Completed,
            (Some(_), None) => OrderStatus::InProgress,
            (None, None) => OrderStatus::Queued,
        };
        record
    }

    #[test]
    fn status_follows_timestamps() {
        let r = record(10, Some(20), Some(30));
        assert_eq!(status_at(&r, at(9)), None);
        assert_eq!(status_at(&r, at(10)), Some(OrderStatus::Queued));
        assert_eq!(status_at(&r, at(19)), Some(OrderStatus::Queued));
        assert_eq!(status_at(&r, at(20)), Some(OrderStatus::InProgress));
        assert_eq!(status_at(&r, at(30)), Some(OrderStatus::Completed));
        assert_eq!(status_at(&r, at(1_000)), Some(OrderStatus::Completed));
    }

    #[test]
    fn unfinished_orders_stay_in_their_last_status() {
        let queued = record(0, None, None);
        let started = record(0, Some(5), None);
        assert_eq!(status_at(&queued, at(10_000)), Some(OrderStatus::Queued));
        assert_eq!(status_at(&started, at(10_000)), Some(OrderStatus::InProgress));
    }

    #[test]
    fn counts_partition_arrived_orders() {
        let records = vec![
            record(0, Some(0), Some(5)),
            record(0, Some(5), Some(10)),
            record(3, None, None),
            record(50, None, None),
        ];
        let counts = counts_at(&records, at(6));
        assert_eq!(
            counts,
            StatusCounts {
                queued: 1,
                in_progress: 1,
                completed: 1
            }
        );
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(OrderStatus::InProgress), 1);
    }

    #[test]
    fn orders_by_status_reads_the_status_column() {
        let records = vec![
            record(0, Some(1), Some(2)),
            record(0, Some(1), None),
            record(0, None, None),
            record(0, None, None),
        ];
        let counts = orders_by_status(&records);
        assert_eq!((counts.queued, counts.in_progress, counts.completed), (2, 1, 1));
    }
}
