//! Normalization of a raw capture into generic records: renamed node types,
//! renamed parameters, and connection endpoints rewritten to the generic
//! vocabulary.
//!
//! Every function here is pure over its inputs; the raw capture is never
//! mutated in place. Fan-in is collapsed at this stage: a source node seen
//! through several tree paths becomes one arena entry.

use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::ir::{
    Capture, MaterialData, NodeIndex, NodeInfo, NodeParameter, OutputMap, RawConnection, RawNode,
    RawParam,
};
use crate::vocab::{Renderer, SourceProfile, Vocabulary, generic_output_key};

/// Rewrite raw output slots to their generic keys, metadata passed through
/// unchanged (slot names are already renderer-independent at this layer).
pub fn standardize_output_map(outputs: &OutputMap) -> OutputMap {
    outputs
        .iter()
        .map(|(slot, record)| (generic_output_key(slot), record.clone()))
        .collect()
}

/// Translate the parameters that have a generic name; drop the rest. The
/// drop is intentional and permanent: a parameter with no generic equivalent
/// cannot be represented.
pub fn standardize_parameters(
    vocab: &Vocabulary,
    node_type: &str,
    parms: &[RawParam],
) -> Vec<NodeParameter> {
    let Some(table) = vocab.param_table(node_type) else {
        if !parms.is_empty() {
            warn!("no parameter mapping table for node type '{node_type}'");
        }
        return Vec::new();
    };

    let mut dropped: Vec<&str> = Vec::new();
    let mut parameters = Vec::new();
    for parm in parms {
        let Some(generic_name) = table.get(&parm.name) else {
            dropped.push(&parm.name);
            continue;
        };
        parameters.push(NodeParameter {
            generic_name: generic_name.clone(),
            generic_type: parm.param_type,
            direction: parm.direction,
            value: parm.value.clone().normalized(),
        });
    }
    if !dropped.is_empty() {
        warn!("parameters with no generic name on '{node_type}': {dropped:?}");
    }
    parameters
}

/// Rewrite every endpoint's `parm_name` to its generic form where a mapping
/// exists, leaving it raw otherwise. Returns a new map.
pub fn standardize_connections(
    vocab: &Vocabulary,
    connections: &BTreeMap<String, RawConnection>,
) -> BTreeMap<String, RawConnection> {
    connections
        .iter()
        .map(|(key, connection)| {
            let mut connection = connection.clone();
            for endpoint in [&mut connection.input, &mut connection.output] {
                match vocab.generic_param_name(&endpoint.node_type, &endpoint.parm_name) {
                    Some(generic) => endpoint.parm_name = generic.to_string(),
                    None => warn!(
                        "no generic name for connection parameter '{}' on '{}'",
                        endpoint.parm_name, endpoint.node_type
                    ),
                }
            }
            (key.clone(), connection)
        })
        .collect()
}

struct ArenaBuilder<'a> {
    vocab: &'a Vocabulary,
    renderer: Renderer,
    profile: SourceProfile,
    nodes: Vec<NodeInfo>,
    by_path: HashMap<String, NodeIndex>,
}

impl ArenaBuilder<'_> {
    /// Standardize one raw node and everything upstream of it. A path seen
    /// before contributes its child edges and connection records to the
    /// existing entry; each sighting carries only the edges attributed to
    /// its own consumer, so the records must be merged, not discarded.
    fn add(&mut self, raw: &RawNode) -> NodeIndex {
        if let Some(&index) = self.by_path.get(&raw.node_path) {
            let connections = standardize_connections(self.vocab, &raw.connections_dict);
            for (key, connection) in connections {
                self.nodes[index].connection_info.entry(key).or_insert(connection);
            }
            let children: Vec<NodeIndex> =
                raw.children_list.iter().map(|c| self.add(c)).collect();
            self.link_children(index, children);
            return index;
        }

        let node_type = self
            .vocab
            .generic_node_type(self.renderer, self.profile, &raw.node_type)
            .map(str::to_string);
        if node_type.is_none() {
            warn!("no generic type for node type '{}'", raw.node_type);
        }

        let index = self.nodes.len();
        self.nodes.push(NodeInfo {
            node_type,
            node_name: raw.node_name.clone(),
            node_path: raw.node_path.clone(),
            parameters: standardize_parameters(self.vocab, &raw.node_type, &raw.node_parms),
            connection_info: standardize_connections(self.vocab, &raw.connections_dict),
            children: Vec::new(),
            is_output_node: raw.is_output_node,
            output_type: raw.output_type.clone().filter(|_| raw.is_output_node),
            position: raw.node_position,
        });
        self.by_path.insert(raw.node_path.clone(), index);

        let children: Vec<NodeIndex> = raw.children_list.iter().map(|c| self.add(c)).collect();
        self.link_children(index, children);
        index
    }

    fn link_children(&mut self, index: NodeIndex, children: Vec<NodeIndex>) {
        for child in children {
            if !self.nodes[index].children.contains(&child) {
                self.nodes[index].children.push(child);
            }
        }
    }
}

/// Standardize a capture into a [`MaterialData`]: one arena entry per source
/// path, generic output map, generic parameters and connections.
pub fn standardize(
    capture: &Capture,
    vocab: &Vocabulary,
    renderer: Renderer,
    profile: SourceProfile,
    material_name: &str,
    material_path: &str,
) -> MaterialData {
    let mut builder = ArenaBuilder {
        vocab,
        renderer,
        profile,
        nodes: Vec::new(),
        by_path: HashMap::new(),
    };
    let roots: Vec<NodeIndex> = capture.tree.values().map(|raw| builder.add(raw)).collect();

    MaterialData {
        material_name: material_name.to_string(),
        material_path: material_path.to_string(),
        nodes: builder.nodes,
        roots,
        output_connections: standardize_output_map(&capture.outputs),
    }
}
