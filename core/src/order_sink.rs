//! Order sink trait and related types.
//!
//! The lifecycle never writes to storage directly. It returns
//! [`Effect::Persist`](crate::effect::Effect::Persist) carrying a [`SinkWrite`],
//! and the executor awaits the write before processing anything else, so a
//! transition is durable before the lifecycle moves past it.
//!
//! # Implementations
//!
//! - `PostgresOrderSink` (in `kitchen-sim-postgres`): the `orders` table
//! - `InMemoryOrderSink` (in `kitchen-sim-testing`): deterministic tests

use crate::order::{NewOrderRecord, OrderId, OrderRecord, OrderStatus};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Boxed future returned by [`OrderSink`] methods
pub type SinkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, OrderSinkError>> + Send + 'a>>;

/// Errors that can occur while persisting or reading orders.
#[derive(Error, Debug)]
pub enum OrderSinkError {
    /// Database connection or statement failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be converted to or from the domain model.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The order has no row.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The write would move the order backward, skip a state, or repeat one.
    #[error("Invalid transition for order {order_id}: {current} -> {requested}")]
    InvalidTransition {
        /// The order being written.
        order_id: OrderId,
        /// Status currently stored.
        current: OrderStatus,
        /// Status the write asked for.
        requested: OrderStatus,
    },

    /// The write's timestamp precedes the previous transition's timestamp.
    #[error("Order {order_id}: {requested} at {at} precedes previous transition at {previous}")]
    OutOfOrder {
        /// The order being written.
        order_id: OrderId,
        /// Status the write asked for.
        requested: OrderStatus,
        /// Timestamp of the write.
        at: DateTime<Utc>,
        /// Timestamp of the previous transition.
        previous: DateTime<Utc>,
    },
}

/// Durable storage for order lifecycle transitions.
///
/// Every write must be atomic and durable before its future resolves.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the sink can be
/// shared as `Arc<dyn OrderSink>` inside effects.
pub trait OrderSink: Send + Sync {
    /// Insert a new row with status `Queued`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition`: a row with this id already exists
    /// - `Database`: the insert failed
    fn insert_order(&self, record: NewOrderRecord) -> SinkFuture<'_, ()>;

    /// Set `started_at` and move the row to `In Progress`.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound`: no row with this id
    /// - `InvalidTransition`: the row is not `Queued`
    /// - `OutOfOrder`: `at` precedes `received_at`
    /// - `Database`: the update failed
    fn mark_started(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()>;

    /// Set `completed_at` and move the row to `Completed`.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound`: no row with this id
    /// - `InvalidTransition`: the row is not `In Progress`
    /// - `OutOfOrder`: `at` precedes `started_at`
    /// - `Database`: the update failed
    fn mark_completed(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()>;

    /// Load every stored row, ordered by id.
    ///
    /// # Errors
    ///
    /// - `Database`: the query failed
    /// - `Serialization`: a row holds a value outside the domain model
    fn load_orders(&self) -> SinkFuture<'_, Vec<OrderRecord>>;
}

/// A lifecycle transition to be persisted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Pending → Queued: insert the row
    Received(NewOrderRecord),
    /// Queued → In Progress
    Started {
        /// Order identifier
        order_id: OrderId,
        /// Virtual time of the first cook grant
        at: DateTime<Utc>,
    },
    /// In Progress → Completed
    Completed {
        /// Order identifier
        order_id: OrderId,
        /// Virtual time the last item finished
        at: DateTime<Utc>,
    },
}

impl Transition {
    /// The order this transition belongs to
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::Received(record) => record.order_id,
            Self::Started { order_id, .. } | Self::Completed { order_id, .. } => *order_id,
        }
    }

    /// The status the order is in after this transition
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        match self {
            Self::Received(_) => OrderStatus::Queued,
            Self::Started { .. } => OrderStatus::InProgress,
            Self::Completed { .. } => OrderStatus::Completed,
        }
    }

    /// Virtual time of the transition
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Received(record) => record.received_at,
            Self::Started { at, .. } | Self::Completed { at, .. } => *at,
        }
    }
}

/// A transition bound to the sink that will store it
pub struct SinkWrite {
    /// Destination
    pub sink: Arc<dyn OrderSink>,
    /// What to write
    pub transition: Transition,
}

impl SinkWrite {
    /// Perform the write.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error unchanged.
    pub async fn execute(self) -> Result<(), OrderSinkError> {
        match self.transition {
            Transition::Received(record) => self.sink.insert_order(record).await,
            Transition::Started { order_id, at } => self.sink.mark_started(order_id, at).await,
            Transition::Completed { order_id, at } => self.sink.mark_completed(order_id, at).await,
        }
    }
}
