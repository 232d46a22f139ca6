//! # Kitchen Sim Testing
//!
//! Testing utilities and helpers for the kitchen simulation.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - In-memory order sinks that enforce the lifecycle and log every write
//! - Fixture builders for orders and menus
//! - Property-based testing strategies
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use kitchen_sim_testing::{InMemoryOrderSink, SinkCall};
//!
//! #[tokio::test]
//! async fn every_order_is_written_three_times() {
//!     let sink = Arc::new(InMemoryOrderSink::new());
//!     run_simulation(orders, menu, sink.clone()).await?;
//!
//!     assert_eq!(sink.calls().len(), 3 * orders.len());
//! }
//! ```

use chrono::{DateTime, Utc};
use kitchen_sim_core::environment::Clock;

mod order_sink_mocks;
mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use kitchen_sim_testing::mocks::FixedClock;
    /// use kitchen_sim_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Fixed clock at 2020-04-25 16:00:00 UTC, the date of the sample orders
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::from_timestamp(1_587_830_400, 0).unwrap_or_default())
    }
}

/// Fixture builders for core types
pub mod fixtures {
    use chrono::{DateTime, Utc};
    use kitchen_sim_core::order::{LineItem, Money, Order, OrderId};

    /// `2020-04-25T16:00:00Z` shifted by `offset_secs`
    #[must_use]
    pub fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_587_830_400 + offset_secs, 0).unwrap_or_default()
    }

    /// Line item priced at $1.00 per unit
    #[must_use]
    pub fn item(name: &str, quantity: u32) -> LineItem {
        LineItem::new(name.to_string(), Money::from_cents(100), quantity)
    }

    /// Order `id` placed `offset_secs` after [`at(0)`](at)
    #[must_use]
    pub fn order(id: u64, offset_secs: i64, items: Vec<LineItem>) -> Order {
        Order {
            id: OrderId::new(id),
            customer_name: format!("Customer {id}"),
            service: "Caviar".to_string(),
            ordered_at: at(offset_secs),
            items,
        }
    }
}

/// Property-based testing strategies
pub mod properties {
    use crate::fixtures;
    use kitchen_sim_core::order::{LineItem, Money, Order};
    use proptest::prelude::*;

    /// Names used by [`arb_line_item`]; pair them with [`MENU_NAMES`]-based menus
    pub const MENU_NAMES: [&str; 4] = ["Burger", "Fries", "Shake", "Salad"];

    /// A line item drawn from [`MENU_NAMES`] with quantity 0..=3
    pub fn arb_line_item() -> impl Strategy<Value = LineItem> {
        (prop::sample::select(&MENU_NAMES[..]), 1i64..2_000, 0u32..=3).prop_map(
            |(name, cents, quantity)| LineItem::new(name.to_string(), Money::from_cents(cents), quantity),
        )
    }

    /// Up to `max_orders` orders, ids 1.., placed within an hour in any order
    pub fn arb_orders(max_orders: usize) -> impl Strategy<Value = Vec<Order>> {
        prop::collection::vec(
            (0i64..3_600, prop::collection::vec(arb_line_item(), 0..4)),
            0..=max_orders,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .zip(1u64..)
                .map(|((offset, items), id)| fixtures::order(id, offset, items))
                .collect()
        })
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use order_sink_mocks::{FailingOrderSink, InMemoryOrderSink, SinkCall};
pub use reducer_test::{ReducerTest, assertions};
