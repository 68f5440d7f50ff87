//! Node/interface mapping table published by the topology service
//!
//! The topology service answers `GET /topologies/{network}/ns_convert_table`
//! with a JSON document whose `tp_name_table` key maps each emulated node to
//! its interfaces:
//!
//! ```json
//! {
//!   "tp_name_table": {
//!     "r1": { "eth0.0": { "l3_model": "GigabitEthernet0/0/0", "l1_agent": "..." } }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod refresh;
mod store;

pub use self::store::{LoadedMapping, MappingStore};

/// Interface record for one emulated interface
///
/// Only `l3_model` is used; any other keys in the record are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InterfaceEntry {
    pub l3_model: String,
}

/// Emulated interface key (`<interface>.0`) to interface record
pub type InterfaceMap = HashMap<String, InterfaceEntry>;

/// Node name to its interface map
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MappingTable(HashMap<String, InterfaceMap>);

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interface map of a node (exact, case-sensitive match)
    pub fn node(&self, node_name: &str) -> Option<&InterfaceMap> {
        self.0.get(node_name)
    }

    /// Add or replace a single entry; used when building tables by hand
    pub fn insert(
        &mut self,
        node_name: impl Into<String>,
        emulated_interface: impl Into<String>,
        l3_model: impl Into<String>,
    ) {
        self.0.entry(node_name.into()).or_default().insert(
            emulated_interface.into(),
            InterfaceEntry {
                l3_model: l3_model.into(),
            },
        );
    }

    /// Number of nodes in the table
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body of the topology service's `ns_convert_table` response
///
/// `tp_name_table` is optional here so that its absence is reported as a
/// validation failure instead of an opaque decode error. Other keys are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct TopologyResponse {
    #[serde(default)]
    pub tp_name_table: Option<MappingTable>,
}

impl TopologyResponse {
    /// Decode and validate a topology service response body
    pub fn from_json(body: &str) -> crate::error::AppResult<MappingTable> {
        let response: TopologyResponse = serde_json::from_str(body).map_err(|e| {
            crate::error::AppError::RefreshValidation(format!(
                "topology response is not a valid ns_convert_table document: {}",
                e
            ))
        })?;

        response.tp_name_table.ok_or_else(|| {
            crate::error::AppError::RefreshValidation(
                "topology response has no 'tp_name_table' key".to_string(),
            )
        })
    }
}
