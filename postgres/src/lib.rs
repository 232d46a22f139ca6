//! `PostgreSQL` persistence for the kitchen simulation.
//!
//! This crate provides the `PostgreSQL`-backed [`OrderSink`] and the read-side
//! queries over the same table:
//!
//! - [`PostgresOrderSink`]: one atomic, status-guarded statement per lifecycle
//!   transition
//! - [`migrations`]: create, drop and reset the `orders` table
//! - [`queries`]: status counts computed in SQL
//!
//! Every statement is parameterised; no value is ever interpolated into SQL.
//!
//! # Example
//!
//! ```ignore
//! use kitchen_sim_postgres::{PostgresOrderSink, migrations};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = PostgresOrderSink::connect("postgres://localhost/kitchen", 5, Duration::from_secs(5)).await?;
//!     migrations::recreate_orders_table(sink.pool()).await?;
//!     Ok(())
//! }
//! ```
//!
//! [`OrderSink`]: kitchen_sim_core::order_sink::OrderSink

pub mod migrations;
pub mod queries;
mod sink;

pub use sink::PostgresOrderSink;

use kitchen_sim_core::order_sink::OrderSinkError;

/// Wrap a driver error as [`OrderSinkError::Database`].
pub(crate) fn db_error(error: sqlx::Error) -> OrderSinkError {
    OrderSinkError::Database(error.to_string())
}
