//! In-memory order sinks for fast, deterministic tests
//!
//! - [`InMemoryOrderSink`]: enforces the lifecycle like the database does and
//!   logs every successful write
//! - [`FailingOrderSink`]: fails every write of one status

use chrono::{DateTime, Utc};
use kitchen_sim_core::order::{NewOrderRecord, OrderId, OrderRecord, OrderStatus};
use kitchen_sim_core::order_sink::{OrderSink, OrderSinkError, SinkFuture};
use std::collections::BTreeMap;
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One successful sink write, in the order it happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    /// `insert_order`
    InsertOrder {
        /// Order written
        order_id: OrderId,
        /// Its `received_at`
        received_at: DateTime<Utc>,
    },
    /// `mark_started`
    MarkStarted {
        /// Order written
        order_id: OrderId,
        /// Its `started_at`
        at: DateTime<Utc>,
    },
    /// `mark_completed`
    MarkCompleted {
        /// Order written
        order_id: OrderId,
        /// Its `completed_at`
        at: DateTime<Utc>,
    },
}

impl SinkCall {
    /// Order the call wrote
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::InsertOrder { order_id, .. }
            | Self::MarkStarted { order_id, .. }
            | Self::MarkCompleted { order_id, .. } => *order_id,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<OrderId, OrderRecord>,
    calls: Vec<SinkCall>,
}

/// In-memory order sink.
///
/// Applies the same guards as the Postgres sink: inserts must be new, each
/// update must follow the previous status, and timestamps must not go back.
///
/// # Example
///
/// ```
/// use kitchen_sim_testing::{InMemoryOrderSink, SinkCall, fixtures};
/// use kitchen_sim_core::order::NewOrderRecord;
/// use kitchen_sim_core::order_sink::OrderSink;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = InMemoryOrderSink::new();
/// let order = fixtures::order(1, 0, vec![fixtures::item("Fries", 1)]);
/// sink.insert_order(NewOrderRecord::from_order(&order, fixtures::at(0))).await?;
/// sink.mark_started(order.id, fixtures::at(5)).await?;
///
/// assert_eq!(sink.calls().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderSink {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryOrderSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every successful write so far
    #[must_use]
    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().calls.clone()
    }

    /// Successful writes for one order
    #[must_use]
    pub fn calls_for(&self, order_id: OrderId) -> Vec<SinkCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.order_id() == order_id)
            .cloned()
            .collect()
    }

    /// Current rows, ordered by id
    #[must_use]
    pub fn records(&self) -> Vec<OrderRecord> {
        self.lock().records.values().cloned().collect()
    }

    /// One row
    #[must_use]
    pub fn record(&self, order_id: OrderId) -> Option<OrderRecord> {
        self.lock().records.get(&order_id).cloned()
    }

    fn insert(&self, record: NewOrderRecord) -> Result<(), OrderSinkError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.records.get(&record.order_id) {
            return Err(OrderSinkError::InvalidTransition {
                order_id: record.order_id,
                current: existing.status,
                requested: OrderStatus::Queued,
            });
        }
        inner.calls.push(SinkCall::InsertOrder {
            order_id: record.order_id,
            received_at: record.received_at,
        });
        inner.records.insert(record.order_id, OrderRecord::from(record));
        Ok(())
    }

    fn advance(
        &self,
        order_id: OrderId,
        requested: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderSinkError> {
        let mut inner = self.lock();
        let record = inner
            .records
            .get_mut(&order_id)
            .ok_or(OrderSinkError::OrderNotFound(order_id))?;

        if requested.previous() != Some(record.status) {
            return Err(OrderSinkError::InvalidTransition {
                order_id,
                current: record.status,
                requested,
            });
        }

        let previous = match requested {
            OrderStatus::Completed => record.started_at.unwrap_or(record.received_at),
            OrderStatus::Queued | OrderStatus::InProgress => record.received_at,
        };
        if at < previous {
            return Err(OrderSinkError::OutOfOrder {
                order_id,
                requested,
                at,
                previous,
            });
        }

        record.status = requested;
        let call = if requested == OrderStatus::Completed {
            record.completed_at = Some(at);
            SinkCall::MarkCompleted { order_id, at }
        } else {
            record.started_at = Some(at);
            SinkCall::MarkStarted { order_id, at }
        };
        inner.calls.push(call);
        Ok(())
    }
}

impl OrderSink for InMemoryOrderSink {
    fn insert_order(&self, record: NewOrderRecord) -> SinkFuture<'_, ()> {
        Box::pin(ready(self.insert(record)))
    }

    fn mark_started(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        Box::pin(ready(self.advance(order_id, OrderStatus::InProgress, at)))
    }

    fn mark_completed(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        Box::pin(ready(self.advance(order_id, OrderStatus::Completed, at)))
    }

    fn load_orders(&self) -> SinkFuture<'_, Vec<OrderRecord>> {
        Box::pin(ready(Ok(self.records())))
    }
}

/// Sink that fails every write of one status and stores everything else.
#[derive(Clone, Debug)]
pub struct FailingOrderSink {
    fail_on: OrderStatus,
    inner: InMemoryOrderSink,
}

impl FailingOrderSink {
    /// Fail every write that would move an order to `fail_on`
    #[must_use]
    pub fn new(fail_on: OrderStatus) -> Self {
        Self {
            fail_on,
            inner: InMemoryOrderSink::new(),
        }
    }

    /// The writes that went through
    #[must_use]
    pub const fn inner(&self) -> &InMemoryOrderSink {
        &self.inner
    }

    fn check(&self, status: OrderStatus, order_id: OrderId) -> Result<(), OrderSinkError> {
        if status == self.fail_on {
            Err(OrderSinkError::Database(format!(
                "simulated failure writing {status} for order {order_id}"
            )))
        } else {
            Ok(())
        }
    }
}

impl OrderSink for FailingOrderSink {
    fn insert_order(&self, record: NewOrderRecord) -> SinkFuture<'_, ()> {
        match self.check(OrderStatus::Queued, record.order_id) {
            Ok(()) => self.inner.insert_order(record),
            Err(e) => Box::pin(ready(Err(e))),
        }
    }

    fn mark_started(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        match self.check(OrderStatus::InProgress, order_id) {
            Ok(()) => self.inner.mark_started(order_id, at),
            Err(e) => Box::pin(ready(Err(e))),
        }
    }

    fn mark_completed(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        match self.check(OrderStatus::Completed, order_id) {
            Ok(()) => self.inner.mark_completed(order_id, at),
            Err(e) => Box::pin(ready(Err(e))),
        }
    }

    fn load_orders(&self) -> SinkFuture<'_, Vec<OrderRecord>> {
        self.inner.load_orders()
    }
}
