//! Kitchen state and actions.

use chrono::{DateTime, Utc};
use kitchen_sim_core::order::{Order, OrderId};
use kitchen_sim_runtime::{PoolError, ResourcePool};
use std::collections::BTreeMap;
use std::time::Duration;

/// One unit of one line item; each unit is cooked separately
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemUnit {
    /// Order the unit belongs to
    pub order_id: OrderId,
    /// Menu item name
    pub name: String,
    /// Time one cook needs for this unit
    pub cook_time: Duration,
}

/// Actions driving the kitchen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KitchenAction {
    /// An order reaches the kitchen
    OrderArrived {
        /// The order as placed
        order: Order,
        /// Its item units, in line-item order, cook times already resolved
        units: Vec<ItemUnit>,
    },
    /// A cook finished `unit`
    ItemFinished {
        /// The unit that is done
        unit: ItemUnit,
    },
}

/// Where an order is in its lifecycle.
///
/// `Pending` orders have not arrived yet and are not tracked by
/// [`KitchenState`]; [`KitchenState::phase`] reports them for completeness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderPhase {
    /// Not yet arrived
    Pending,
    /// Arrived, waiting for its first cook
    Queued,
    /// At least one unit handed to a cook
    InProgress,
    /// Every unit cooked
    Completed,
}

/// Per-order bookkeeping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderProgress {
    /// Current phase
    pub phase: OrderPhase,
    /// Units not yet finished
    pub remaining_units: usize,
    /// Arrival time
    pub received_at: DateTime<Utc>,
    /// First cook grant
    pub started_at: Option<DateTime<Utc>>,
    /// Last unit finished
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything the kitchen reducer owns
#[derive(Clone, Debug)]
pub struct KitchenState {
    /// The cooks, handed out to item units in arrival order
    pub cooks: ResourcePool<ItemUnit>,
    /// Arrived orders by id
    pub orders: BTreeMap<OrderId, OrderProgress>,
}

impl KitchenState {
    /// Empty kitchen with `num_cooks` cooks.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ZeroCapacity`] if `num_cooks` is 0.
    pub fn new(num_cooks: usize) -> Result<Self, PoolError> {
        Ok(Self {
            cooks: ResourcePool::new(num_cooks)?,
            orders: BTreeMap::new(),
        })
    }

    /// Phase of `order_id`; unknown orders are `Pending`
    #[must_use]
    pub fn phase(&self, order_id: OrderId) -> OrderPhase {
        self.orders
            .get(&order_id)
            .map_or(OrderPhase::Pending, |progress| progress.phase)
    }

    /// Orders in `phase`
    #[must_use]
    pub fn count_in(&self, phase: OrderPhase) -> usize {
        self.orders.values().filter(|progress| progress.phase == phase).count()
    }
}
