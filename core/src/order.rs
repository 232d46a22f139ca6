//! Order domain model.
//!
//! An [`Order`] is built from input data before the simulation starts. Each
//! [`LineItem`] expands into `quantity` independent item units; the units are
//! what compete for cooks. The persisted view of an order is an
//! [`OrderRecord`], created by the Queued transition ([`NewOrderRecord`]) and
//! filled in by the started and completed transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Identifier of an order, assigned from its 1-based position in the input
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates a new `OrderId`
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount in cents (to avoid floating point issues)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a new money amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a money amount from a dollar figure, rounded to the nearest cent
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // prices are far below i64::MAX cents
    pub fn from_dollars(dollars: f64) -> Self {
        Self((dollars * 100.0).round() as i64)
    }

    /// Returns the value in cents
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns the value in dollars (as floating point)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // i64 to f64 precision loss is acceptable for display
    pub fn dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies a unit price by a quantity
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.dollars())
    }
}

/// A single line item in an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Menu item name, used to look up the cook time
    pub name: String,
    /// Price per unit
    pub unit_price: Money,
    /// Number of units; each unit is cooked separately
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item
    #[must_use]
    pub const fn new(name: String, unit_price: Money, quantity: u32) -> Self {
        Self {
            name,
            unit_price,
            quantity,
        }
    }

    /// Calculates the total price for this line item
    #[must_use]
    pub const fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A customer order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Customer name
    pub customer_name: String,
    /// Service channel (free text, e.g. a delivery partner)
    pub service: String,
    /// When the order was placed, truncated to whole seconds
    pub ordered_at: DateTime<Utc>,
    /// Line items
    pub items: Vec<LineItem>,
}

impl Order {
    /// Sum of `unit_price × quantity` over all items
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.items.iter().map(LineItem::total).sum()
    }

    /// Number of item units after quantity expansion
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.items.iter().map(|item| item.quantity as usize).sum()
    }

    /// Name → quantity map; repeated names are summed
    #[must_use]
    pub fn item_quantities(&self) -> BTreeMap<String, u32> {
        let mut quantities = BTreeMap::new();
        for item in &self.items {
            *quantities.entry(item.name.clone()).or_insert(0) += item.quantity;
        }
        quantities
    }

    /// The persisted `items` column: a JSON object of name → quantity
    #[must_use]
    pub fn items_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .item_quantities()
            .into_iter()
            .map(|(name, quantity)| (name, serde_json::Value::from(quantity)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

/// Status of an order in its lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Arrived; no item has been given to a cook yet
    Queued,
    /// At least one item is being (or has been) cooked
    InProgress,
    /// Every item has been cooked
    Completed,
}

impl OrderStatus {
    /// All statuses in lifecycle order
    pub const ALL: [Self; 3] = [Self::Queued, Self::InProgress, Self::Completed];

    /// Database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Parse a status from its database string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// The status that must precede this one, if any
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Queued => None,
            Self::InProgress => Some(Self::Queued),
            Self::Completed => Some(Self::InProgress),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the Queued transition: the row as first inserted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRecord {
    /// Order identifier
    pub order_id: OrderId,
    /// Virtual time the order arrived
    pub received_at: DateTime<Utc>,
    /// Customer name
    pub customer_name: String,
    /// Service channel
    pub service: String,
    /// Total order value
    pub total_price: Money,
    /// JSON name → quantity map
    pub items: String,
}

impl NewOrderRecord {
    /// Builds the Queued row for `order`, received at `received_at`
    #[must_use]
    pub fn from_order(order: &Order, received_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            received_at,
            customer_name: order.customer_name.clone(),
            service: order.service.clone(),
            total_price: order.total_price(),
            items: order.items_json(),
        }
    }
}

/// One persisted order row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Order identifier
    pub id: OrderId,
    /// Current status
    pub status: OrderStatus,
    /// When the order arrived
    pub received_at: DateTime<Utc>,
    /// When the first item was given to a cook
    pub started_at: Option<DateTime<Utc>>,
    /// When the last item finished
    pub completed_at: Option<DateTime<Utc>>,
    /// Customer name
    pub customer_name: String,
    /// Service channel
    pub service: String,
    /// Total order value
    pub total_price: Money,
    /// JSON name → quantity map
    pub items: String,
}

impl OrderRecord {
    /// Whether `received_at ≤ started_at ≤ completed_at` holds for the set fields
    #[must_use]
    pub fn timestamps_ordered(&self) -> bool {
        let started_ok = self.started_at.is_none_or(|s| self.received_at <= s);
        let completed_ok = match (self.started_at, self.completed_at) {
            (_, None) => true,
            (Some(s), Some(c)) => s <= c,
            (None, Some(_)) => false,
        };
        started_ok && completed_ok
    }

    /// Decode the `items` column
    ///
    /// # Errors
    ///
    /// Returns an error if the column is not a JSON object of name → quantity.
    pub fn item_quantities(&self) -> Result<BTreeMap<String, u32>, serde_json::Error> {
        serde_json::from_str(&self.items)
    }
}

impl From<NewOrderRecord> for OrderRecord {
    fn from(new: NewOrderRecord) -> Self {
        Self {
            id: new.order_id,
            status: OrderStatus::Queued,
            received_at: new.received_at,
            started_at: None,
            completed_at: None,
            customer_name: new.customer_name,
            service: new.service,
            total_price: new.total_price,
            items: new.items,
        }
    }
}
