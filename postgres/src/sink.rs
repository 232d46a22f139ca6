//! `PostgreSQL` implementation of [`OrderSink`].

use crate::db_error;
use chrono::{DateTime, Utc};
use kitchen_sim_core::order::{Money, NewOrderRecord, OrderId, OrderRecord, OrderStatus};
use kitchen_sim_core::order_sink::{OrderSink, OrderSinkError, SinkFuture};
use kitchen_sim_runtime::retry::{RetryPolicy, retry_with_predicate};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

// Prices are bound and read as integer cents so no float touches NUMERIC.
const INSERT_ORDER: &str = r"
    INSERT INTO orders (id, status, received_at, customer_name, service, total_price, items)
    VALUES ($1, $2, $3, $4, $5, $6::BIGINT::NUMERIC / 100, $7)
    ON CONFLICT (id) DO NOTHING
";

const MARK_STARTED: &str = r"
    UPDATE orders
    SET status = $2, started_at = $3
    WHERE id = $1 AND status = $4 AND received_at <= $3
";

const MARK_COMPLETED: &str = r"
    UPDATE orders
    SET status = $2, completed_at = $3
    WHERE id = $1 AND status = $4 AND started_at <= $3
";

const SELECT_ORDERS: &str = r"
    SELECT id, status, received_at, started_at, completed_at,
           customer_name, service, (total_price * 100)::BIGINT AS total_cents, items
    FROM orders
    ORDER BY id
";

/// `PostgreSQL`-backed order sink.
///
/// Each transition is a single statement whose `WHERE` clause requires the
/// previous status and a non-decreasing timestamp, so a write is atomic and
/// can never move a row backward. When a statement matches no row the sink
/// reads the row once to report why.
///
/// Failures to obtain a pooled connection are retried according to the
/// configured [`RetryPolicy`]; the statement has not been sent in that case.
/// Any other error is returned as is.
#[derive(Clone, Debug)]
pub struct PostgresOrderSink {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PostgresOrderSink {
    /// Create a sink over an existing connection pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`OrderSinkError::Database`] if the connection fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, OrderSinkError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| OrderSinkError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self::from_pool(pool))
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, record: NewOrderRecord) -> Result<(), OrderSinkError> {
        let id = db_id(record.order_id)?;
        let result = retry_with_predicate(
            &self.retry,
            || {
                sqlx::query(INSERT_ORDER)
                    .bind(id)
                    .bind(OrderStatus::Queued.as_str())
                    .bind(record.received_at.timestamp())
                    .bind(&record.customer_name)
                    .bind(&record.service)
                    .bind(record.total_price.cents())
                    .bind(&record.items)
                    .execute(&self.pool)
            },
            is_pool_timeout,
        )
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(self
                .explain_rejection(record.order_id, OrderStatus::Queued, record.received_at)
                .await);
        }

        metrics::counter!("order_sink_writes_total", "status" => OrderStatus::Queued.as_str())
            .increment(1);
        Ok(())
    }

    async fn advance(
        &self,
        order_id: OrderId,
        requested: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderSinkError> {
        let (sql, previous) = match requested {
            OrderStatus::InProgress => (MARK_STARTED, OrderStatus::Queued),
            OrderStatus::Completed => (MARK_COMPLETED, OrderStatus::InProgress),
            OrderStatus::Queued => {
                return Err(OrderSinkError::InvalidTransition {
                    order_id,
                    current: OrderStatus::Queued,
                    requested,
                });
            },
        };
        let id = db_id(order_id)?;

        let result = retry_with_predicate(
            &self.retry,
            || {
                sqlx::query(sql)
                    .bind(id)
                    .bind(requested.as_str())
                    .bind(at.timestamp())
                    .bind(previous.as_str())
                    .execute(&self.pool)
            },
            is_pool_timeout,
        )
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(self.explain_rejection(order_id, requested, at).await);
        }

        metrics::counter!("order_sink_writes_total", "status" => requested.as_str()).increment(1);
        Ok(())
    }

    /// Work out why a guarded write matched no row.
    async fn explain_rejection(
        &self,
        order_id: OrderId,
        requested: OrderStatus,
        at: DateTime<Utc>,
    ) -> OrderSinkError {
        let row = match db_id(order_id) {
            Ok(id) => sqlx::query("SELECT status, received_at, started_at FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error),
            Err(e) => Err(e),
        };

        let row = match row {
            Ok(Some(row)) => row,
            Ok(None) => return OrderSinkError::OrderNotFound(order_id),
            Err(e) => return e,
        };

        let current = match row
            .try_get::<String, _>("status")
            .map_err(db_error)
            .and_then(|s| parse_status(&s))
        {
            Ok(status) => status,
            Err(e) => return e,
        };

        if requested.previous() != Some(current) {
            return OrderSinkError::InvalidTransition {
                order_id,
                current,
                requested,
            };
        }

        let column = if requested == OrderStatus::Completed {
            "started_at"
        } else {
            "received_at"
        };
        match row.try_get::<Option<i64>, _>(column).map_err(db_error) {
            Ok(Some(secs)) => match from_epoch(secs) {
                Ok(previous) => OrderSinkError::OutOfOrder {
                    order_id,
                    requested,
                    at,
                    previous,
                },
                Err(e) => e,
            },
            Ok(None) => OrderSinkError::Serialization(format!(
                "order {order_id} is {current} but has no {column}"
            )),
            Err(e) => e,
        }
    }

    async fn load(&self) -> Result<Vec<OrderRecord>, OrderSinkError> {
        let rows = retry_with_predicate(
            &self.retry,
            || sqlx::query(SELECT_ORDERS).fetch_all(&self.pool),
            is_pool_timeout,
        )
        .await
        .map_err(db_error)?;

        rows.iter().map(record_from_row).collect()
    }
}

impl OrderSink for PostgresOrderSink {
    fn insert_order(&self, record: NewOrderRecord) -> SinkFuture<'_, ()> {
        Box::pin(self.insert(record))
    }

    fn mark_started(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        Box::pin(self.advance(order_id, OrderStatus::InProgress, at))
    }

    fn mark_completed(&self, order_id: OrderId, at: DateTime<Utc>) -> SinkFuture<'_, ()> {
        Box::pin(self.advance(order_id, OrderStatus::Completed, at))
    }

    fn load_orders(&self) -> SinkFuture<'_, Vec<OrderRecord>> {
        Box::pin(self.load())
    }
}

const fn is_pool_timeout(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::PoolTimedOut)
}

fn db_id(order_id: OrderId) -> Result<i64, OrderSinkError> {
    i64::try_from(order_id.value())
        .map_err(|_| OrderSinkError::Serialization(format!("order id {order_id} exceeds BIGINT")))
}

fn parse_status(value: &str) -> Result<OrderStatus, OrderSinkError> {
    OrderStatus::parse(value)
        .ok_or_else(|| OrderSinkError::Serialization(format!("unknown order status {value:?}")))
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>, OrderSinkError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| OrderSinkError::Serialization(format!("timestamp {secs} out of range")))
}

fn record_from_row(row: &PgRow) -> Result<OrderRecord, OrderSinkError> {
    let id: i64 = row.try_get("id").map_err(db_error)?;
    let status: String = row.try_get("status").map_err(db_error)?;
    let received_at: i64 = row.try_get("received_at").map_err(db_error)?;
    let started_at: Option<i64> = row.try_get("started_at").map_err(db_error)?;
    let completed_at: Option<i64> = row.try_get("completed_at").map_err(db_error)?;

    Ok(OrderRecord {
        id: OrderId::new(
            u64::try_from(id)
                .map_err(|_| OrderSinkError::Serialization(format!("negative order id {id}")))?,
        ),
        status: parse_status(&status)?,
        received_at: from_epoch(received_at)?,
        started_at: started_at.map(from_epoch).transpose()?,
        completed_at: completed_at.map(from_epoch).transpose()?,
        customer_name: row.try_get("customer_name").map_err(db_error)?,
        service: row.try_get("service").map_err(db_error)?,
        total_price: Money::from_cents(row.try_get("total_cents").map_err(db_error)?),
        items: row.try_get("items").map_err(db_error)?,
    })
}
