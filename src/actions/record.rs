//! Exported form of actions and action graphs.
//!
//! Records carry everything needed to rebuild an action in another runtime:
//! identity token, kind, display label, enabled flag and the behavior's own
//! parameters. Runtime state is not exported; an imported action starts in
//! `None`.
//!
//! Behavior parameters are stored as a JSON string so the record stays
//! encodable by non-self-describing formats such as bincode.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, TriggerError};

/// One exported action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Identity token of the exported action.
    pub name: String,
    pub kind: String,
    pub edition_name: Option<String>,
    pub enabled: bool,
    /// Behavior parameters as JSON, when the behavior saves any.
    pub params: Option<String>,
}

impl ActionRecord {
    /// Decode the behavior parameters.
    pub fn params_value(&self) -> Result<Option<serde_json::Value>> {
        self.params
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| TriggerError::Serialization(err.to_string()))
    }
}

/// An action plus the positions of its successors within the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub action: ActionRecord,
    pub successors: SmallVec<[u32; 2]>,
}

/// An exported action graph. Node 0 is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGraphRecord {
    pub nodes: Vec<GraphNode>,
}

impl ActionGraphRecord {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bytes written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: Self = bincode::deserialize(bytes)?;
        record.validate()?;
        Ok(record)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| TriggerError::Serialization(err.to_string()))
    }

    /// Decode JSON written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Self =
            serde_json::from_str(json).map_err(|err| TriggerError::Serialization(err.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Check that every successor index points inside the graph.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(bad) = node.successors.iter().find(|&&s| s as usize >= len) {
                return Err(TriggerError::Serialization(format!(
                    "node {index} links to missing node {bad}"
                )));
            }
        }
        Ok(())
    }
}
