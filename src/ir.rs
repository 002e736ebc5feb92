//! Intermediate records the pipeline moves between stages.
//!
//! The raw capture (tree + output map) serializes to JSON with stable field
//! names and doubles as the golden-file format for regression tests: a
//! conversion can be replayed headlessly from a saved capture instead of a
//! live graph.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

/// Whether a parameter is fed into a node or exposed as a result socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

// ---------------------------------------------------------------------------
// Raw capture, as produced by traversal
// ---------------------------------------------------------------------------

/// One captured parameter occurrence, still under its renderer-specific name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ValueType,
    pub direction: Direction,
    pub value: Value,
}

/// One end of a captured edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEndpoint {
    pub node_name: String,
    pub node_path: String,
    pub node_type: String,
    pub node_index: usize,
    pub parm_name: String,
}

/// A captured edge. `input` is the upstream side (the node the record lives
/// on), `output` is the consuming side the edge was attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConnection {
    pub input: RawEndpoint,
    pub output: RawEndpoint,
}

/// One node of the captured source network, children nested under it. A node
/// reachable through two paths is captured once per sighting; the
/// standardizer collapses the copies by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub node_name: String,
    pub node_path: String,
    pub node_type: String,
    #[serde(default)]
    pub node_parms: Vec<RawParam>,
    #[serde(default)]
    pub connections_dict: BTreeMap<String, RawConnection>,
    #[serde(default)]
    pub children_list: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_output_node: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_position: Option<[f32; 2]>,
}

/// Which node drives one root output slot and under what names on both
/// sides. Keyed `surface`/`displacement` in the raw map and
/// `GENERIC::output_*` after standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub node_name: String,
    pub node_path: String,
    pub connected_node_name: String,
    pub connected_node_path: String,
    pub connected_input_index: Option<usize>,
    pub connected_input_name: String,
    pub connected_output_name: String,
}

pub type RawTree = BTreeMap<String, RawNode>;
pub type OutputMap = BTreeMap<String, OutputRecord>;

/// A traversal result: the nested node tree plus the output-socket map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub tree: RawTree,
    pub outputs: OutputMap,
}

impl Capture {
    pub fn from_json(text: &str) -> Result<Capture> {
        serde_json::from_str(text).map_err(|e| anyhow!("failed to parse capture json: {e}"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Capture> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read capture at {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write capture to {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Standardized records
// ---------------------------------------------------------------------------

/// Index of a [`NodeInfo`] inside its [`MaterialData`] arena.
pub type NodeIndex = usize;

/// One standardized parameter: generic name, semantic type, direction and the
/// payload with singleton tuples already unwrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeParameter {
    pub generic_name: String,
    pub generic_type: ValueType,
    pub direction: Direction,
    pub value: Value,
}

/// One standardized shader node. `node_type` is `None` when the vocabulary
/// had no entry for the raw type; recreation then falls back to the target's
/// null-equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_type: Option<String>,
    pub node_name: String,
    pub node_path: String,
    pub parameters: Vec<NodeParameter>,
    pub connection_info: BTreeMap<String, RawConnection>,
    /// Upstream neighbors as arena indices; fan-in shares one entry.
    pub children: Vec<NodeIndex>,
    pub is_output_node: bool,
    pub output_type: Option<String>,
    pub position: Option<[f32; 2]>,
}

/// A standardized material: a flat arena of nodes (one entry per source
/// path), the root indices, and the generic output-connection map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub material_name: String,
    pub material_path: String,
    pub nodes: Vec<NodeInfo>,
    pub roots: Vec<NodeIndex>,
    pub output_connections: OutputMap,
}

impl MaterialData {
    pub fn node(&self, index: NodeIndex) -> &NodeInfo {
        &self.nodes[index]
    }

    pub fn index_of_path(&self, path: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.node_path == path)
    }

    /// Indices in depth-first order from the roots; each node once.
    pub fn ordered_indices(&self) -> Vec<NodeIndex> {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeIndex> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if !seen.insert(index) {
                continue;
            }
            order.push(index);
            for &child in self.nodes[index].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}
