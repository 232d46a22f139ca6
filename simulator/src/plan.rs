//! Turning loaded orders into a schedule of arrivals.

use crate::error::SimulatorError;
use crate::menu::Menu;
use crate::types::ItemUnit;
use chrono::{DateTime, Utc};
use kitchen_sim_core::order::{Order, OrderId};
use kitchen_sim_runtime::metrics::KitchenMetrics;
use std::time::Duration;

/// Time between the simulation origin and the earliest order
pub const ORIGIN_BUFFER: Duration = Duration::from_secs(10);

/// An order ready to be scheduled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedOrder {
    /// The order
    pub order: Order,
    /// One entry per unit, cook times resolved
    pub units: Vec<ItemUnit>,
    /// Arrival relative to [`SimulationPlan::origin`]
    pub arrival_offset: Duration,
}

/// Validated input for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationPlan {
    /// Virtual start time
    pub origin: DateTime<Utc>,
    /// Orders that will arrive, in input order
    pub orders: Vec<PlannedOrder>,
    /// Orders dropped because they hold no item units
    pub skipped: Vec<OrderId>,
}

fn expand_units(order: &Order, menu: &Menu) -> Result<Vec<ItemUnit>, SimulatorError> {
    let mut units = Vec::with_capacity(order.unit_count());
    for item in &order.items {
        let cook_time = menu
            .cook_time(&item.name)
            .ok_or_else(|| SimulatorError::UnknownMenuItem {
                order_id: order.id,
                item: item.name.clone(),
            })?;
        units.extend((0..item.quantity).map(|_| ItemUnit {
            order_id: order.id,
            name: item.name.clone(),
            cook_time,
        }));
    }
    Ok(units)
}

impl SimulationPlan {
    /// Validate `orders` against `menu` and compute arrival offsets.
    ///
    /// The origin sits [`ORIGIN_BUFFER`] before the earliest order. Every item
    /// name is checked, including those of orders that end up skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::UnknownMenuItem`] for the first item the menu
    /// does not list.
    pub fn build(orders: Vec<Order>, menu: &Menu) -> Result<Self, SimulatorError> {
        let origin = orders
            .iter()
            .map(|order| order.ordered_at)
            .min()
            .and_then(|earliest| {
                chrono::Duration::from_std(ORIGIN_BUFFER)
                    .ok()
                    .and_then(|buffer| earliest.checked_sub_signed(buffer))
            })
            .unwrap_or_default();

        let mut planned = Vec::with_capacity(orders.len());
        let mut skipped = Vec::new();
        for order in orders {
            let units = expand_units(&order, menu)?;
            if units.is_empty() {
                tracing::info!(order_id = %order.id, "Skipping order with no items");
                KitchenMetrics::record_skipped();
                skipped.push(order.id);
                continue;
            }
            let arrival_offset = (order.ordered_at - origin).to_std().unwrap_or_default();
            planned.push(PlannedOrder {
                order,
                units,
                arrival_offset,
            });
        }

        Ok(Self {
            origin,
            orders: planned,
            skipped,
        })
    }

    /// Total item units across all planned orders
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.orders.iter().map(|planned| planned.units.len()).sum()
    }
}
