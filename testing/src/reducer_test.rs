//! Ergonomic testing utilities for reducers
//!
//! Given-When-Then over a single `reduce` call, plus effect assertions.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use kitchen_sim_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use kitchen_sim_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(KitchenReducer)
///     .with_env(environment)
///     .given_state(KitchenState::new(1)?)
///     .when_action(KitchenAction::OrderArrived { order, units })
///     .then_state(|state| assert_eq!(state.cooks.in_use(), 1))
///     .then_effects(|effects| {
///         assertions::assert_persisted(effects, &[OrderStatus::Queued, OrderStatus::InProgress]);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Apply `action` before the action under test; its effects are discarded (Given)
    #[must_use]
    pub fn given_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        assert!(!self.actions.is_empty(), "Action must be set with when_action()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use kitchen_sim_core::effect::Effect;
    use kitchen_sim_core::order::OrderStatus;
    use std::time::Duration;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert the statuses persisted by `effects`, in order
    ///
    /// # Panics
    ///
    /// Panics if the persisted statuses differ from `expected`.
    pub fn assert_persisted<A>(effects: &[Effect<A>], expected: &[OrderStatus]) {
        let persisted: Vec<OrderStatus> =
            effects.iter().filter_map(Effect::persisted_status).collect();
        assert_eq!(persisted, expected, "Unexpected persisted transitions");
    }

    /// Assert the durations of every `Delay` in `effects`, in order
    ///
    /// # Panics
    ///
    /// Panics if the delays differ from `expected`.
    pub fn assert_delays<A>(effects: &[Effect<A>], expected: &[Duration]) {
        let delays: Vec<Duration> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Delay { duration, .. } => Some(*duration),
                Effect::None | Effect::Persist(_) => None,
            })
            .collect();
        assert_eq!(delays, expected, "Unexpected delays");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitchen_sim_core::effect::Effect;
    use kitchen_sim_core::reducer::Reducer;
    use kitchen_sim_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Later,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = i32;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut i32,
            action: TestAction,
            _env: &(),
        ) -> SmallVec<[Effect<TestAction>; 4]> {
            match action {
                TestAction::Increment => {
                    *state += 1;
                    smallvec![Effect::None]
                },
                TestAction::Later => {
                    smallvec![Effect::delay(Duration::from_secs(3), TestAction::Increment)]
                },
            }
        }
    }

    #[test]
    fn test_given_actions_accumulate_state() {
        ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(0)
            .given_action(TestAction::Increment)
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(*state, 2))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_delay_assertion() {
        ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(0)
            .when_action(TestAction::Later)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_delays(effects, &[Duration::from_secs(3)]);
                assertions::assert_persisted(effects, &[]);
            })
            .run();
    }
}
