//! One kitchen run from plan to report.

use crate::error::SimulatorError;
use crate::menu::Menu;
use crate::plan::SimulationPlan;
use crate::reducer::{KitchenEnvironment, KitchenReducer};
use crate::types::{KitchenAction, KitchenState, OrderPhase};
use chrono::{DateTime, Utc};
use kitchen_sim_core::order::Order;
use kitchen_sim_core::order_sink::OrderSink;
use kitchen_sim_runtime::{Pacing, Simulation, VirtualClock};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a finished run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Orders that arrived and were queued
    pub orders_received: usize,
    /// Orders dropped at setup
    pub orders_skipped: usize,
    /// Orders with every unit cooked
    pub orders_completed: usize,
    /// Events the executor dispatched
    pub events_processed: u64,
    /// Virtual start time
    pub origin: DateTime<Utc>,
    /// Virtual time of the last event
    pub finished_at: DateTime<Utc>,
    /// Most cooks busy at once
    pub peak_cooks_busy: usize,
}

/// A kitchen ready to run.
pub struct KitchenSimulation {
    simulation: Simulation<KitchenReducer>,
    origin: DateTime<Utc>,
    orders_skipped: usize,
}

impl KitchenSimulation {
    /// Schedule every planned arrival on a fresh virtual clock.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::InvalidConfig`] if `num_cooks` is 0, or a
    /// simulation error if an arrival does not fit on the timeline.
    pub fn new(
        plan: SimulationPlan,
        num_cooks: usize,
        pacing: Pacing,
        sink: Arc<dyn OrderSink>,
    ) -> Result<Self, SimulatorError> {
        let state = KitchenState::new(num_cooks).map_err(|e| SimulatorError::InvalidConfig(e.to_string()))?;
        let clock = VirtualClock::new(plan.origin);
        let environment = KitchenEnvironment::new(sink, Arc::new(clock.clone()));
        let mut simulation = Simulation::new(state, KitchenReducer::new(), environment, clock, pacing);

        for planned in plan.orders {
            simulation.schedule(
                planned.arrival_offset,
                KitchenAction::OrderArrived {
                    order: planned.order,
                    units: planned.units,
                },
            )?;
        }

        Ok(Self {
            simulation,
            origin: plan.origin,
            orders_skipped: plan.skipped.len(),
        })
    }

    /// Run until every order is completed.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Simulation`] if a transition could not be
    /// persisted; the run stops at that point.
    pub async fn run(mut self) -> Result<SimulationReport, SimulatorError> {
        tracing::info!(origin = %self.origin, events = self.simulation.pending_events(), "Simulation starting");
        let summary = match self.simulation.run().await {
            Ok(summary) => summary,
            Err(error) => {
                tracing::error!(%error, "Simulation aborted");
                return Err(error.into());
            },
        };

        let state = self.simulation.into_state();
        let report = SimulationReport {
            orders_received: state.orders.len(),
            orders_skipped: self.orders_skipped,
            orders_completed: state.count_in(OrderPhase::Completed),
            events_processed: summary.events_processed,
            origin: self.origin,
            finished_at: summary.finished_at,
            peak_cooks_busy: state.cooks.peak_in_use(),
        };
        tracing::info!(
            received = report.orders_received,
            completed = report.orders_completed,
            skipped = report.orders_skipped,
            events = report.events_processed,
            finished_at = %report.finished_at,
            "Simulation finished"
        );
        Ok(report)
    }
}

/// Plan and run in one call
///
/// # Errors
///
/// Any error of [`SimulationPlan::build`], [`KitchenSimulation::new`] or
/// [`KitchenSimulation::run`].
pub async fn run_simulation(
    orders: Vec<Order>,
    menu: &Menu,
    num_cooks: usize,
    pacing: Pacing,
    sink: Arc<dyn OrderSink>,
) -> Result<SimulationReport, SimulatorError> {
    let plan = SimulationPlan::build(orders, menu)?;
    KitchenSimulation::new(plan, num_cooks, pacing, sink)?.run().await
}
