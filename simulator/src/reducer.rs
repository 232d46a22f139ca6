//! Kitchen reducer implementing the order lifecycle.
//!
//! An order moves `Queued → InProgress → Completed`:
//!
//! - `OrderArrived` persists the Queued row, then asks the cook pool for
//!   every item unit. Granted units start cooking at once; the rest wait in
//!   line behind units of earlier orders.
//! - The first grant for an order, whether on arrival or when a cook is
//!   handed over later, persists the Started transition exactly once.
//! - `ItemFinished` counts the unit down, persists Completed after the last
//!   one, then passes the cook to the longest waiting unit.

use crate::types::{ItemUnit, KitchenAction, KitchenState, OrderPhase, OrderProgress};
use kitchen_sim_core::effect::Effect;
use kitchen_sim_core::environment::Clock;
use kitchen_sim_core::order::{NewOrderRecord, Order};
use kitchen_sim_core::order_sink::{OrderSink, Transition};
use kitchen_sim_core::reducer::Reducer;
use kitchen_sim_core::{SmallVec, smallvec};
use kitchen_sim_runtime::Acquire;
use kitchen_sim_runtime::metrics::KitchenMetrics;
use std::sync::Arc;

type Effects = SmallVec<[Effect<KitchenAction>; 4]>;

/// Environment for the kitchen reducer
#[derive(Clone)]
pub struct KitchenEnvironment {
    /// Where lifecycle transitions are written
    pub sink: Arc<dyn OrderSink>,
    /// Virtual clock
    pub clock: Arc<dyn Clock>,
}

impl KitchenEnvironment {
    /// Creates a new kitchen environment
    #[must_use]
    pub fn new(sink: Arc<dyn OrderSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }
}

/// Reducer for the kitchen
#[derive(Clone, Debug, Default)]
pub struct KitchenReducer;

impl KitchenReducer {
    /// Creates a new kitchen reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn order_arrived(
        state: &mut KitchenState,
        order: &Order,
        units: Vec<ItemUnit>,
        env: &KitchenEnvironment,
    ) -> Effects {
        if state.orders.contains_key(&order.id) {
            tracing::warn!(order_id = %order.id, "Ignoring duplicate arrival");
            return smallvec![Effect::None];
        }
        if units.is_empty() {
            tracing::warn!(order_id = %order.id, "Ignoring arrival of an order with no item units");
            return smallvec![Effect::None];
        }

        let now = env.clock.now();
        state.orders.insert(
            order.id,
            OrderProgress {
                phase: OrderPhase::Queued,
                remaining_units: units.len(),
                received_at: now,
                started_at: None,
                completed_at: None,
            },
        );
        KitchenMetrics::record_received();
        tracing::info!(order_id = %order.id, at = %now, units = units.len(), "Order received");

        let mut effects: Effects = smallvec![Effect::persist(
            &env.sink,
            Transition::Received(NewOrderRecord::from_order(order, now)),
        )];

        for unit in units {
            match state.cooks.acquire(unit) {
                Acquire::Granted(unit) => Self::start_unit(state, unit, env, &mut effects),
                Acquire::Queued { position } => {
                    tracing::debug!(order_id = %order.id, position, "Item unit waiting for a cook");
                },
            }
        }

        KitchenMetrics::record_load(state.cooks.in_use(), state.cooks.waiting());
        effects
    }

    /// `unit` now holds a cook: mark its order started if this is the first
    /// grant and schedule the finish.
    fn start_unit(state: &mut KitchenState, unit: ItemUnit, env: &KitchenEnvironment, effects: &mut Effects) {
        let now = env.clock.now();
        if let Some(progress) = state.orders.get_mut(&unit.order_id) {
            if progress.phase == OrderPhase::Queued {
                progress.phase = OrderPhase::InProgress;
                progress.started_at = Some(now);
                KitchenMetrics::record_started();
                tracing::info!(order_id = %unit.order_id, at = %now, "Order started");
                effects.push(Effect::persist(
                    &env.sink,
                    Transition::Started {
                        order_id: unit.order_id,
                        at: now,
                    },
                ));
            }
        }

        tracing::debug!(
            order_id = %unit.order_id,
            item = %unit.name,
            cook_time_secs = unit.cook_time.as_secs(),
            cooks_busy = state.cooks.in_use(),
            waiting = state.cooks.waiting(),
            "Cook assigned"
        );
        effects.push(Effect::delay(unit.cook_time, KitchenAction::ItemFinished { unit }));
    }

    fn item_finished(state: &mut KitchenState, unit: &ItemUnit, env: &KitchenEnvironment) -> Effects {
        let now = env.clock.now();
        let Some(progress) = state
            .orders
            .get_mut(&unit.order_id)
            .filter(|progress| progress.phase == OrderPhase::InProgress)
        else {
            tracing::warn!(order_id = %unit.order_id, "Ignoring finished item for an order that is not in progress");
            return smallvec![Effect::None];
        };

        KitchenMetrics::record_item_cooked();
        progress.remaining_units = progress.remaining_units.saturating_sub(1);

        let mut effects = Effects::new();
        if progress.remaining_units == 0 {
            progress.phase = OrderPhase::Completed;
            progress.completed_at = Some(now);
            KitchenMetrics::record_completed();
            tracing::info!(order_id = %unit.order_id, at = %now, "Order completed");
            effects.push(Effect::persist(
                &env.sink,
                Transition::Completed {
                    order_id: unit.order_id,
                    at: now,
                },
            ));
        }

        match state.cooks.release() {
            Ok(Some(next)) => Self::start_unit(state, next, env, &mut effects),
            Ok(None) => {},
            Err(error) => {
                tracing::error!(%error, order_id = %unit.order_id, "Cook pool out of balance");
            },
        }

        KitchenMetrics::record_load(state.cooks.in_use(), state.cooks.waiting());
        if effects.is_empty() {
            effects.push(Effect::None);
        }
        effects
    }
}

impl Reducer for KitchenReducer {
    type State = KitchenState;
    type Action = KitchenAction;
    type Environment = KitchenEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            KitchenAction::OrderArrived { order, units } => Self::order_arrived(state, &order, units, env),
            KitchenAction::ItemFinished { unit } => Self::item_finished(state, &unit, env),
        }
    }
}
