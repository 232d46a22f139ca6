//! Discrete-event executor.
//!
//! A [`Simulation`] owns a reducer's state and a queue of actions scheduled
//! at virtual times. [`Simulation::run`] repeatedly takes the earliest
//! action, advances the [`VirtualClock`] to its time, reduces it and carries
//! out the returned effects in order:
//!
//! - `Delay` schedules the boxed action `duration` after the current time
//! - `Persist` is awaited before anything else happens; a failure ends the run
//!
//! Actions scheduled for the same instant are processed in the order they
//! were scheduled.

use crate::clock::{Pacer, Pacing, VirtualClock};
use crate::error::SimulationError;
use crate::metrics::SimulationMetrics;
use chrono::{DateTime, Utc};
use kitchen_sim_core::effect::Effect;
use kitchen_sim_core::environment::Clock;
use kitchen_sim_core::reducer::Reducer;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// An action waiting on the virtual timeline
struct Scheduled<A> {
    at: DateTime<Utc>,
    seq: u64,
    action: A,
}

// Ordered by (at, seq) only; the action takes no part in scheduling.
impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Actions dispatched to the reducer
    pub events_processed: u64,
    /// Virtual time when the run stopped
    pub finished_at: DateTime<Utc>,
    /// Actions still scheduled (non-zero only after [`Simulation::run_until`])
    pub pending: usize,
}

/// Single-threaded discrete-event executor for a reducer.
pub struct Simulation<R: Reducer> {
    reducer: R,
    state: R::State,
    environment: R::Environment,
    clock: VirtualClock,
    pacer: Pacer,
    queue: BinaryHeap<Reverse<Scheduled<R::Action>>>,
    next_seq: u64,
    events_processed: u64,
}

impl<R> Simulation<R>
where
    R: Reducer,
{
    /// Create an executor whose timeline starts at the clock's current time.
    ///
    /// The environment should read time from a clone of `clock`.
    #[must_use]
    pub fn new(
        state: R::State,
        reducer: R,
        environment: R::Environment,
        clock: VirtualClock,
        pacing: Pacing,
    ) -> Self {
        let origin = clock.now();
        Self {
            reducer,
            state,
            environment,
            clock,
            pacer: Pacer::new(pacing, origin),
            queue: BinaryHeap::new(),
            next_seq: 0,
            events_processed: 0,
        }
    }

    /// Schedule `action` to fire `delay` after the current virtual time.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::DelayOutOfRange`] if the resulting time is
    /// not representable.
    pub fn schedule(&mut self, delay: Duration, action: R::Action) -> Result<(), SimulationError> {
        let at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|offset| self.clock.now().checked_add_signed(offset))
            .ok_or(SimulationError::DelayOutOfRange(delay))?;
        self.push(at, action);
        Ok(())
    }

    fn push(&mut self, at: DateTime<Utc>, action: R::Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq, action }));
    }

    /// Process events until none are left.
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure; no later event is processed.
    pub async fn run(&mut self) -> Result<RunSummary, SimulationError> {
        self.drive(None).await
    }

    /// Process events scheduled at or before `until`, leaving later ones queued.
    ///
    /// The clock ends at `until` if that is later than the last processed event.
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure; no later event is processed.
    pub async fn run_until(&mut self, until: DateTime<Utc>) -> Result<RunSummary, SimulationError> {
        let summary = self.drive(Some(until)).await?;
        self.clock.advance_to(until);
        Ok(RunSummary {
            finished_at: self.clock.now(),
            ..summary
        })
    }

    async fn drive(&mut self, until: Option<DateTime<Utc>>) -> Result<RunSummary, SimulationError> {
        self.pacer.start();

        while let Some(Reverse(next)) = self.queue.peek() {
            if until.is_some_and(|limit| next.at > limit) {
                break;
            }
            let Some(Reverse(Scheduled { at, action, .. })) = self.queue.pop() else {
                break;
            };

            self.pacer.wait_until(at).await;
            self.clock.advance_to(at);

            let effects = self
                .reducer
                .reduce(&mut self.state, action, &self.environment);
            self.events_processed += 1;
            SimulationMetrics::record_event();

            for effect in effects {
                self.execute(effect).await?;
            }
        }

        tracing::debug!(
            events_processed = self.events_processed,
            pending = self.queue.len(),
            "Simulation run stopped"
        );

        Ok(RunSummary {
            events_processed: self.events_processed,
            finished_at: self.clock.now(),
            pending: self.queue.len(),
        })
    }

    async fn execute(&mut self, effect: Effect<R::Action>) -> Result<(), SimulationError> {
        match effect {
            Effect::None => Ok(()),
            Effect::Delay { duration, action } => self.schedule(duration, *action),
            Effect::Persist(write) => {
                let order_id = write.transition.order_id();
                let status = write.transition.status();
                let started = std::time::Instant::now();
                write.execute().await.map_err(|source| {
                    tracing::error!(%order_id, %status, error = %source, "Failed to persist transition");
                    SimulationError::Persistence { order_id, source }
                })?;
                SimulationMetrics::record_sink_write(started.elapsed());
                Ok(())
            },
        }
    }

    /// Current state
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// Consume the executor, returning its state
    pub fn into_state(self) -> R::State {
        self.state
    }

    /// Current virtual time
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of scheduled actions not yet processed
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use kitchen_sim_core::order::{OrderId, OrderStatus};
    use kitchen_sim_core::order_sink::{OrderSink, Transition};
    use kitchen_sim_core::{SmallVec, smallvec};
    use kitchen_sim_testing::{FailingOrderSink, InMemoryOrderSink};
    use std::sync::Arc;

    fn origin() -> DateTime<Utc> {
        DateTime::from_timestamp(1_587_830_390, 0).unwrap()
    }

    /// Records (label, time) for every action; `Echo` schedules a follow-up.
    #[derive(Debug, Clone)]
    enum TestAction {
        Mark(&'static str),
        Echo { label: &'static str, after: Duration },
        Start(OrderId),
    }

    struct TestEnv {
        clock: VirtualClock,
        sink: Arc<dyn OrderSink>,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = Vec<(&'static str, i64)>;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: TestAction,
            env: &TestEnv,
        ) -> SmallVec<[Effect<TestAction>; 4]> {
            let now = env.clock.now().timestamp() - origin().timestamp();
            match action {
                TestAction::Mark(label) => {
                    state.push((label, now));
                    smallvec![Effect::None]
                },
                TestAction::Echo { label, after } => {
                    state.push((label, now));
                    smallvec![Effect::delay(after, TestAction::Mark("echoed"))]
                },
                TestAction::Start(order_id) => {
                    state.push(("start", now));
                    smallvec![
                        Effect::persist(&env.sink, Transition::Started {
                            order_id,
                            at: env.clock.now(),
                        }),
                        Effect::delay(Duration::from_secs(1), TestAction::Mark("after-start")),
                    ]
                },
            }
        }
    }

    fn simulation(sink: Arc<dyn OrderSink>) -> Simulation<TestReducer> {
        let clock = VirtualClock::new(origin());
        let env = TestEnv {
            clock: clock.clone(),
            sink,
        };
        Simulation::new(Vec::new(), TestReducer, env, clock, Pacing::Instant)
    }

    #[tokio::test]
    async fn processes_in_time_order_then_schedule_order() {
        let mut sim = simulation(Arc::new(InMemoryOrderSink::new()));
        sim.schedule(Duration::from_secs(20), TestAction::Mark("c")).unwrap();
        sim.schedule(Duration::from_secs(10), TestAction::Mark("a")).unwrap();
        sim.schedule(Duration::from_secs(10), TestAction::Mark("b")).unwrap();

        let summary = sim.run().await.unwrap();

        assert_eq!(sim.state(), &vec![("a", 10), ("b", 10), ("c", 20)]);
        assert_eq!(summary.events_processed, 3);
        assert_eq!(summary.pending, 0);
        assert_eq!(summary.finished_at, origin() + chrono::Duration::seconds(20));
    }

    #[tokio::test]
    async fn delay_effect_fires_relative_to_current_time() {
        let mut sim = simulation(Arc::new(InMemoryOrderSink::new()));
        sim.schedule(
            Duration::from_secs(10),
            TestAction::Echo {
                label: "echo",
                after: Duration::from_secs(5),
            },
        )
        .unwrap();
        sim.schedule(Duration::from_secs(15), TestAction::Mark("same-instant")).unwrap();

        sim.run().await.unwrap();

        // the pre-scheduled event was queued first, so it wins the tie
        assert_eq!(
            sim.state(),
            &vec![("echo", 10), ("same-instant", 15), ("echoed", 15)]
        );
    }

    #[tokio::test]
    async fn run_until_leaves_later_events_pending() {
        let mut sim = simulation(Arc::new(InMemoryOrderSink::new()));
        sim.schedule(Duration::from_secs(5), TestAction::Mark("early")).unwrap();
        sim.schedule(Duration::from_secs(50), TestAction::Mark("late")).unwrap();

        let summary = sim.run_until(origin() + chrono::Duration::seconds(30)).await.unwrap();
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.finished_at, origin() + chrono::Duration::seconds(30));
        assert_eq!(sim.state().len(), 1);

        let summary = sim.run().await.unwrap();
        assert_eq!(summary.pending, 0);
        assert_eq!(sim.into_state(), vec![("early", 5), ("late", 50)]);
    }

    #[tokio::test]
    async fn persistence_failure_stops_the_run() {
        let sink = Arc::new(FailingOrderSink::new(OrderStatus::InProgress));
        let mut sim = simulation(sink);
        sim.schedule(Duration::from_secs(1), TestAction::Start(OrderId::new(3))).unwrap();
        sim.schedule(Duration::from_secs(2), TestAction::Mark("never")).unwrap();

        let result = sim.run().await;

        assert!(matches!(
            result,
            Err(SimulationError::Persistence { order_id, .. }) if order_id == OrderId::new(3)
        ));
        // the delay after the failed persist was never scheduled
        assert_eq!(sim.state(), &vec![("start", 1)]);
        assert_eq!(sim.pending_events(), 1);
    }

    #[tokio::test]
    async fn empty_queue_returns_immediately() {
        let mut sim = simulation(Arc::new(InMemoryOrderSink::new()));
        let summary = sim.run().await.unwrap();
        assert_eq!(summary.events_processed, 0);
        assert_eq!(summary.finished_at, origin());
    }

    #[tokio::test(start_paused = true)]
    async fn real_time_pacing_spaces_events_by_speed() {
        let clock = VirtualClock::new(origin());
        let env = TestEnv {
            clock: clock.clone(),
            sink: Arc::new(InMemoryOrderSink::new()),
        };
        let mut sim = Simulation::new(
            Vec::new(),
            TestReducer,
            env,
            clock,
            Pacing::real_time(10.0).unwrap(),
        );
        sim.schedule(Duration::from_secs(60), TestAction::Mark("a")).unwrap();

        let wall = tokio::time::Instant::now();
        sim.run().await.unwrap();

        assert_eq!(wall.elapsed(), Duration::from_secs(6));
        assert_eq!(sim.state(), &vec![("a", 60)]);
    }
}
