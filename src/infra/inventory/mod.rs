//! Inventory source backends.

pub mod memory;
pub mod rzd;

pub use memory::{InMemoryInventorySource, ScriptedLookup};
pub use rzd::{parse_train_pricing, RzdInventorySource, TRAIN_PRICING_PATH};
