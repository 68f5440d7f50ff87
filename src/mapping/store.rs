//! Process-wide holder of the current mapping table

use super::MappingTable;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// A mapping table together with the network it was loaded for
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMapping {
    network_name: String,
    table: MappingTable,
}

impl LoadedMapping {
    pub fn new(network_name: impl Into<String>, table: MappingTable) -> Self {
        Self {
            network_name: network_name.into(),
            table,
        }
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }
}

/// Holds at most one mapping table
///
/// Readers take a snapshot with [`MappingStore::get`] and keep using it for
/// the rest of their request; a concurrent [`MappingStore::replace`] swaps
/// the whole table at once and never affects snapshots already handed out.
#[derive(Debug, Default)]
pub struct MappingStore {
    current: ArcSwapOption<LoadedMapping>,
}

impl MappingStore {
    /// Create an empty store (no table loaded)
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Current mapping, if one has ever been loaded
    pub fn get(&self) -> Option<Arc<LoadedMapping>> {
        self.current.load_full()
    }

    /// Replace the current mapping, returning the previous one
    pub fn replace(&self, mapping: LoadedMapping) -> Option<Arc<LoadedMapping>> {
        self.current.swap(Some(Arc::new(mapping)))
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }
}
