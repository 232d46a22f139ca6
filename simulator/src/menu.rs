//! Menu: item name to per-unit cook time.

use crate::error::SimulatorError;
use crate::input::{MenuItemInput, load_menu_inputs};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Immutable name → cook time lookup
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Menu {
    cook_times: HashMap<String, Duration>,
}

impl Menu {
    /// Build a menu from its entries.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::InvalidMenu`] for a repeated name or a cook
    /// time that is not positive.
    pub fn from_items<I>(items: I) -> Result<Self, SimulatorError>
    where
        I: IntoIterator<Item = MenuItemInput>,
    {
        let mut cook_times = HashMap::new();
        for item in items {
            let secs = u64::try_from(item.cook_time)
                .ok()
                .filter(|&secs| secs > 0)
                .ok_or_else(|| {
                    SimulatorError::InvalidMenu(format!(
                        "cook time for {:?} must be positive, got {}",
                        item.name, item.cook_time
                    ))
                })?;
            if cook_times.insert(item.name.clone(), Duration::from_secs(secs)).is_some() {
                return Err(SimulatorError::InvalidMenu(format!(
                    "{:?} is listed more than once",
                    item.name
                )));
            }
        }
        Ok(Self { cook_times })
    }

    /// Load `items.json`.
    ///
    /// # Errors
    ///
    /// Returns any read or JSON error, or [`SimulatorError::InvalidMenu`].
    pub fn load(path: &Path) -> Result<Self, SimulatorError> {
        Self::from_items(load_menu_inputs(path)?)
    }

    /// Cook time for one unit of `name`
    #[must_use]
    pub fn cook_time(&self, name: &str) -> Option<Duration> {
        self.cook_times.get(name).copied()
    }

    /// Number of menu items
    #[must_use]
    pub fn len(&self) -> usize {
        self.cook_times.len()
    }

    /// Whether the menu has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cook_times.is_empty()
    }
}
