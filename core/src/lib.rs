//! # Kitchen Sim Core
//!
//! Core traits and types for the kitchen order simulation.
//!
//! This crate provides the abstractions the simulation is built from:
//!
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`, where all
//!   lifecycle decisions are made
//! - **Effect**: descriptions of what the executor must do next (wait on the
//!   virtual clock, persist a transition)
//! - **Clock**: injected time source, so the same reducer runs against a virtual
//!   clock in simulation and a fixed clock in tests
//! - **Order model**: orders, line items, money and the persisted order record
//! - **`OrderSink`**: the persistence boundary for lifecycle transitions
//!
//! ## Example
//!
//! ```ignore
//! use kitchen_sim_core::{effect::Effect, reducer::Reducer, SmallVec, smallvec};
//!
//! impl Reducer for KitchenReducer {
//!     type State = KitchenState;
//!     type Action = KitchenAction;
//!     type Environment = KitchenEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut KitchenState,
//!         action: KitchenAction,
//!         env: &KitchenEnvironment,
//!     ) -> SmallVec<[Effect<KitchenAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Order domain model
pub mod order;

/// Persistence boundary for order lifecycle transitions
pub mod order_sink;

/// Order timestamp parsing
pub mod time;

/// Reducer module - The core trait for lifecycle logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never sleep and never touch storage; both are requested through effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Effects are executed by the caller in the order they are returned.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The simulation executor interprets them:
/// a `Delay` suspends the action on the virtual clock, a `Persist` is awaited
/// before anything else happens.
pub mod effect {
    use crate::order::OrderStatus;
    use crate::order_sink::{OrderSink, SinkWrite, Transition};
    use std::sync::Arc;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that delayed effects feed back into the reducer
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Dispatch an action once `duration` of virtual time has elapsed
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Write a lifecycle transition and wait for it to be durable
        Persist(SinkWrite),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Persist(write) => {
                    f.debug_tuple("Effect::Persist").field(&write.transition).finish()
                },
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Schedule `action` after `duration` of virtual time
        #[must_use]
        pub fn delay(duration: Duration, action: Action) -> Self {
            Effect::Delay {
                duration,
                action: Box::new(action),
            }
        }

        /// Persist `transition` through `sink`
        #[must_use]
        pub fn persist(sink: &Arc<dyn OrderSink>, transition: Transition) -> Self {
            Effect::Persist(SinkWrite {
                sink: Arc::clone(sink),
                transition,
            })
        }

        /// The status written by this effect, if it is a `Persist`
        #[must_use]
        pub const fn persisted_status(&self) -> Option<OrderStatus> {
            match self {
                Effect::Persist(write) => Some(write.transition.status()),
                Effect::None | Effect::Delay { .. } => None,
            }
        }
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// In a simulation run the clock is virtual: it only moves when the
    /// executor advances it to the next scheduled event.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::order::{OrderId, OrderStatus};
    use super::order_sink::Transition;
    use std::time::Duration;

    #[test]
    fn delay_effect_debug_shows_action() {
        let effect: Effect<&str> = Effect::delay(Duration::from_secs(5), "finish");
        let debug = format!("{effect:?}");
        assert!(debug.contains("Effect::Delay"));
        assert!(debug.contains("finish"));
        assert_eq!(effect.persisted_status(), None);
    }

    #[test]
    fn transition_status_matches_kind() {
        let at = chrono::DateTime::from_timestamp(1_587_830_400, 0).unwrap_or_default();
        let started = Transition::Started {
            order_id: OrderId::new(1),
            at,
        };
        assert_eq!(started.status(), OrderStatus::InProgress);
        assert_eq!(started.order_id(), OrderId::new(1));
    }
}
