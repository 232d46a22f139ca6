//! Errors for simulation setup and execution.

use kitchen_sim_core::order::OrderId;
use kitchen_sim_core::order_sink::OrderSinkError;
use kitchen_sim_core::time::TimestampError;
use kitchen_sim_runtime::SimulationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the simulator.
///
/// Everything except [`SimulatorError::Simulation`] happens before the first
/// event is processed, so no row has been written yet.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// An input file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An input file is not valid JSON of the expected shape
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// An order timestamp could not be parsed
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// An order names an item the menu does not have
    #[error("Order {order_id} contains unknown menu item {item:?}")]
    UnknownMenuItem {
        /// The order
        order_id: OrderId,
        /// The missing item name
        item: String,
    },

    /// The menu itself is malformed
    #[error("Invalid menu: {0}")]
    InvalidMenu(String),

    /// A configuration value or command-line argument is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was aborted
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Storage could not be prepared or read
    #[error(transparent)]
    Sink(#[from] OrderSinkError),
}
