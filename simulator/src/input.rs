//! JSON input files.
//!
//! `orders.json` is an array of orders:
//!
//! ```json
//! [{
//!     "name": "Ada",
//!     "service": "Caviar",
//!     "ordered_at": "2020-04-25T16:00:00.31415926535",
//!     "items": [{ "name": "Fries", "price_per_unit": 3.25, "quantity": 2 }]
//! }]
//! ```
//!
//! `items.json` is the menu, an array of `{ "name", "cook_time" }` objects
//! where `cook_time` is whole seconds. Other fields are ignored.

use crate::error::SimulatorError;
use kitchen_sim_core::order::{LineItem, Money, Order, OrderId};
use kitchen_sim_core::time::parse_order_time;
use serde::Deserialize;
use std::path::Path;

/// One order as it appears in `orders.json`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OrderInput {
    /// Customer name
    pub name: String,
    /// Service channel
    pub service: String,
    /// ISO-8601 local timestamp, read as UTC
    pub ordered_at: String,
    /// Line items; may be empty
    pub items: Vec<ItemInput>,
}

/// One line item of an [`OrderInput`]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ItemInput {
    /// Menu item name
    pub name: String,
    /// Unit price in dollars
    pub price_per_unit: f64,
    /// Units ordered
    pub quantity: u32,
}

/// One entry of `items.json`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MenuItemInput {
    /// Item name
    pub name: String,
    /// Seconds to cook one unit
    pub cook_time: i64,
}

fn read(path: &Path) -> Result<String, SimulatorError> {
    std::fs::read_to_string(path).map_err(|source| SimulatorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse `orders.json`.
///
/// # Errors
///
/// Returns [`SimulatorError::Io`] or [`SimulatorError::Json`].
pub fn load_order_inputs(path: &Path) -> Result<Vec<OrderInput>, SimulatorError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

/// Read and parse `items.json`.
///
/// # Errors
///
/// Returns [`SimulatorError::Io`] or [`SimulatorError::Json`].
pub fn load_menu_inputs(path: &Path) -> Result<Vec<MenuItemInput>, SimulatorError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

impl OrderInput {
    /// Convert to an [`Order`] with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Timestamp`] if `ordered_at` is malformed.
    pub fn into_order(self, id: OrderId) -> Result<Order, SimulatorError> {
        Ok(Order {
            id,
            customer_name: self.name,
            service: self.service,
            ordered_at: parse_order_time(&self.ordered_at)?,
            items: self
                .items
                .into_iter()
                .map(|item| {
                    LineItem::new(item.name, Money::from_dollars(item.price_per_unit), item.quantity)
                })
                .collect(),
        })
    }
}

/// Convert inputs to orders, numbering them 1.. by position.
///
/// # Errors
///
/// Returns [`SimulatorError::Timestamp`] for the first malformed timestamp.
pub fn build_orders(inputs: Vec<OrderInput>) -> Result<Vec<Order>, SimulatorError> {
    inputs
        .into_iter()
        .zip(1u64..)
        .map(|(input, id)| input.into_order(OrderId::new(id)))
        .collect()
}

/// Load `orders.json` into orders.
///
/// # Errors
///
/// Returns any read, JSON or timestamp error.
pub fn load_orders(path: &Path) -> Result<Vec<Order>, SimulatorError> {
    build_orders(load_order_inputs(path)?)
}
