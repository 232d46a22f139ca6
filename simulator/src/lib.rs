//! # Kitchen Simulator
//!
//! A restaurant kitchen replayed on a virtual clock. Orders arrive at the
//! times they were placed, every item unit waits for one of a fixed number of
//! cooks, and each order's lifecycle is written to storage as it happens:
//!
//! ```text
//! orders.json ─┐
//!              ├─▶ SimulationPlan ─▶ Simulation<KitchenReducer> ─▶ OrderSink
//! items.json ──┘        (origin,          (virtual clock,          (Queued,
//!                        units)            FIFO cook pool)          In Progress,
//!                                                                   Completed)
//! ```
//!
//! - [`plan`]: validates input against the menu, expands item units, drops
//!   orders with nothing to cook and computes arrival offsets
//! - [`reducer`]: the lifecycle, as a pure reducer over [`types::KitchenState`]
//! - [`simulation`]: wires plan, reducer, clock and sink together and runs
//! - [`config`] / [`cli`]: environment configuration and command-line overrides

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod menu;
pub mod plan;
pub mod reducer;
pub mod simulation;
pub mod types;

pub use config::Config;
pub use error::SimulatorError;
pub use menu::Menu;
pub use plan::{PlannedOrder, SimulationPlan};
pub use reducer::{KitchenEnvironment, KitchenReducer};
pub use simulation::{KitchenSimulation, SimulationReport, run_simulation};
pub use types::{ItemUnit, KitchenAction, KitchenState, OrderPhase};
