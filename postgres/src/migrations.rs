//! Schema management for the `orders` table.
//!
//! ```sql
//! CREATE TABLE orders (
//!     id            BIGINT PRIMARY KEY,
//!     status        TEXT NOT NULL CHECK (status IN ('Queued', 'In Progress', 'Completed')),
//!     received_at   BIGINT NOT NULL,
//!     started_at    BIGINT,
//!     completed_at  BIGINT,
//!     customer_name TEXT NOT NULL,
//!     service       TEXT NOT NULL,
//!     total_price   NUMERIC(12,2) NOT NULL,
//!     items         TEXT NOT NULL
//! );
//! ```
//!
//! Timestamps are whole seconds since the Unix epoch. `items` is a JSON object
//! of item name to quantity.

use crate::db_error;
use kitchen_sim_core::order_sink::OrderSinkError;
use sqlx::PgPool;

const CREATE_ORDERS: &str = r"
    CREATE TABLE IF NOT EXISTS orders (
        id BIGINT PRIMARY KEY,
        status TEXT NOT NULL CHECK (status IN ('Queued', 'In Progress', 'Completed')),
        received_at BIGINT NOT NULL,
        started_at BIGINT,
        completed_at BIGINT,
        customer_name TEXT NOT NULL,
        service TEXT NOT NULL,
        total_price NUMERIC(12,2) NOT NULL,
        items TEXT NOT NULL
    )
";

const DROP_ORDERS: &str = "DROP TABLE IF EXISTS orders";

/// Create the `orders` table if it does not exist.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if the statement fails.
pub async fn create_orders_table(pool: &PgPool) -> Result<(), OrderSinkError> {
    sqlx::query(CREATE_ORDERS).execute(pool).await.map_err(db_error)?;
    Ok(())
}

/// Drop the `orders` table if it exists.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if the statement fails.
pub async fn drop_orders_table(pool: &PgPool) -> Result<(), OrderSinkError> {
    sqlx::query(DROP_ORDERS).execute(pool).await.map_err(db_error)?;
    Ok(())
}

/// Drop and recreate the `orders` table in one transaction.
///
/// Leaves an empty table with the current schema whatever was there before.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if either statement or the commit
/// fails; the transaction is rolled back.
pub async fn recreate_orders_table(pool: &PgPool) -> Result<(), OrderSinkError> {
    let mut tx = pool.begin().await.map_err(db_error)?;
    sqlx::query(DROP_ORDERS).execute(&mut *tx).await.map_err(db_error)?;
    sqlx::query(CREATE_ORDERS).execute(&mut *tx).await.map_err(db_error)?;
    tx.commit().await.map_err(db_error)?;

    tracing::info!("Orders table recreated");
    Ok(())
}

/// Delete every row, keeping the table.
///
/// # Errors
///
/// Returns [`OrderSinkError::Database`] if the statement fails.
pub async fn truncate_orders(pool: &PgPool) -> Result<(), OrderSinkError> {
    sqlx::query("TRUNCATE TABLE orders").execute(pool).await.map_err(db_error)?;
    Ok(())
}
