//! Status counts computed in SQL.
//!
//! These use the same predicates as `kitchen_sim_analytics`, so either side
//! can answer the same question: an order is Completed once
//! `completed_at ≤ T`, otherwise In Progress once `started_at ≤ T`, otherwise
//! Queued once `received_at ≤ T`.

use crate::db_error;
use chrono::{DateTime, Utc};
use kitchen_sim_analytics::StatusCounts;
use kitchen_sim_core::order::OrderStatus;
use kitchen_sim_core::order_sink::OrderSinkError;
use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::PgRow;

const COUNTS_AT: &str = r"
    SELECT
        COUNT(*) FILTER (
            WHERE received_at <= $1
              AND (started_at IS NULL OR started_at > $1)
              AND (completed_at IS NULL OR completed_at > $1)
        ) AS queued,
        COUNT(*) FILTER (
            WHERE started_at <= $1
              AND (completed_at IS NULL OR completed_at > $1)
        ) AS in_progress,
        COUNT(*) FILTER (WHERE completed_at <= $1) AS completed
    FROM orders
";

const COUNTS_BY_STATUS: &str = r"
    SELECT
        COUNT(*) FILTER (WHERE status = $1) AS queued,
        COUNT(*) FILTER (WHERE status = $2) AS in_progress,
        COUNT(*) FILTER (WHERE status = $3) AS completed
    FROM orders
";

/// Status counts at instant `at`.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if the query fails.
pub async fn status_counts_at(
    pool: &PgPool,
    at: DateTime<Utc>,
) -> Result<StatusCounts, OrderSinkError> {
    let row = sqlx::query(COUNTS_AT)
        .bind(at.timestamp())
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    counts_from_row(&row)
}

/// Counts by the stored `status` column.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if the query fails.
pub async fn orders_by_status(pool: &PgPool) -> Result<StatusCounts, OrderSinkError> {
    let row = sqlx::query(COUNTS_BY_STATUS)
        .bind(OrderStatus::Queued.as_str())
        .bind(OrderStatus::InProgress.as_str())
        .bind(OrderStatus::Completed.as_str())
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    counts_from_row(&row)
}

fn counts_from_row(row: &PgRow) -> Result<StatusCounts, OrderSinkError> {
    let column = |name: &str| -> Result<usize, OrderSinkError> {
        let count: i64 = row.try_get(name).map_err(db_error)?;
        usize::try_from(count)
            .map_err(|_| OrderSinkError::Serialization(format!("invalid {name} count {count}")))
    };
    Ok(StatusCounts {
        queued: column("queued")?,
        in_progress: column("in_progress")?,
        completed: column("completed")?,
    })
}
