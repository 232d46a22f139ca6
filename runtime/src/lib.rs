//! # Kitchen Sim Runtime
//!
//! Runtime for the kitchen order simulation.
//!
//! ## Core Components
//!
//! - **Simulation**: discrete-event executor that drives a reducer on a virtual
//!   timeline and interprets its effects
//! - **`VirtualClock`** / **`Pacing`**: the simulation clock, optionally paced
//!   against wall-clock time by a speed factor
//! - **`ResourcePool`**: bounded pool of interchangeable workers with strict
//!   FIFO hand-over
//!
//! ## Example
//!
//! ```ignore
//! use kitchen_sim_runtime::{Pacing, Simulation, VirtualClock};
//!
//! let clock = VirtualClock::new(origin);
//! let mut simulation = Simulation::new(state, reducer, environment, clock, Pacing::Instant);
//! simulation.schedule(Duration::from_secs(10), Action::OrderArrived { .. })?;
//! let summary = simulation.run().await?;
//! ```

/// Virtual clock and wall-clock pacing
pub mod clock;

/// Bounded FIFO resource pool
pub mod resource_pool;

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

/// Discrete-event executor
pub mod simulation;

/// Error types for the simulation runtime
pub mod error {
    use kitchen_sim_core::order::OrderId;
    use kitchen_sim_core::order_sink::OrderSinkError;
    use thiserror::Error;

    /// Errors that abort a simulation run
    #[derive(Error, Debug)]
    pub enum SimulationError {
        /// A lifecycle transition could not be persisted.
        ///
        /// The run stops immediately; later transitions are never attempted.
        #[error("Failed to persist transition for order {order_id}: {source}")]
        Persistence {
            /// Order whose transition failed
            order_id: OrderId,
            /// Underlying sink error
            #[source]
            source: OrderSinkError,
        },

        /// A delay does not fit on the virtual timeline
        #[error("Delay of {0:?} is out of range for the virtual clock")]
        DelayOutOfRange(std::time::Duration),

        /// Pacing speed must be a positive, finite number
        #[error("Invalid simulation speed: {0}")]
        InvalidSpeed(f64),
    }
}

pub use clock::{Pacing, VirtualClock};
pub use error::SimulationError;
pub use resource_pool::{Acquire, PoolError, ResourcePool};
pub use simulation::{RunSummary, Simulation};
