//! Reconstruction of a standardized material as a new network in a target
//! renderer's vocabulary.
//!
//! The steps are strictly ordered, later ones depend on the path maps the
//! earlier ones fill in: skeleton creation, output-socket binding, child
//! node materialization, inter-node wiring, output wiring.

mod nodes;
mod skeleton;
mod wiring;

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;

use crate::ir::MaterialData;
use crate::scene::{NodeId, SceneGraph};
use crate::vocab::{Renderer, Vocabulary};

/// Knobs for one recreation run.
#[derive(Debug, Clone, Default)]
pub struct RecreateOptions {
    /// When set, the directory component of image filename parameters is
    /// rewritten to this directory; the basename is kept.
    pub texture_dir: Option<String>,
}

/// A target node resolved for a source path.
#[derive(Debug, Clone)]
pub(crate) struct MappedNode {
    pub name: String,
    pub path: String,
    pub id: NodeId,
}

/// Mutable state of one recreation run; discarded when `run` returns.
pub(crate) struct RunState {
    pub builder: NodeId,
    /// Generic output key to target output-socket handle. `None` for
    /// renderers without discrete output sockets.
    pub output_handles: BTreeMap<String, Option<NodeId>>,
    /// Source node path to the target node standing in for it.
    pub old_new_map: HashMap<String, MappedNode>,
    /// Target nodes already claimed by a source node; reuse skips these.
    pub claimed: HashSet<NodeId>,
    /// Channel splitters keyed by the source node path they split, so two
    /// distinct sources with equal names never alias one splitter.
    pub splitters: HashMap<String, NodeId>,
}

impl RunState {
    fn output_ids(&self) -> Vec<NodeId> {
        self.output_handles.values().flatten().copied().collect()
    }
}

/// Rebuilds a [`MaterialData`] inside a target container.
pub struct Recreator<'a> {
    vocab: &'a Vocabulary,
    target: Renderer,
    options: RecreateOptions,
}

impl<'a> Recreator<'a> {
    pub fn new(vocab: &'a Vocabulary, target: Renderer) -> Self {
        Recreator {
            vocab,
            target,
            options: RecreateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RecreateOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the target network under `parent` and return the new material
    /// container. Missing vocabulary entries, parameters and nodes are
    /// logged and skipped; only an unsupported target aborts.
    pub fn run(
        &self,
        graph: &mut SceneGraph,
        data: &MaterialData,
        parent: NodeId,
    ) -> Result<NodeId> {
        let mut state = skeleton::create(graph, self.target, parent, &data.material_name)?;
        self.bind_output_nodes(graph, data, &mut state);
        nodes::materialize(self.vocab, self.target, &self.options, graph, data, &mut state);
        wiring::wire_nodes(self.vocab, self.target, graph, data, &mut state);
        wiring::wire_outputs(self.vocab, self.target, graph, data, &state);
        Ok(state.builder)
    }

    /// Alias each source output node's path to the target-side socket the
    /// skeleton produced, so later lookups by original path resolve. A no-op
    /// for renderers without discrete output sockets.
    fn bind_output_nodes(&self, graph: &SceneGraph, data: &MaterialData, state: &mut RunState) {
        for (slot, record) in &data.output_connections {
            let Some(Some(handle)) = state.output_handles.get(slot) else {
                continue;
            };
            let node = graph.node(*handle).expect("output handle exists");
            state.old_new_map.insert(
                record.node_path.clone(),
                MappedNode {
                    name: node.name.clone(),
                    path: graph.path(*handle),
                    id: *handle,
                },
            );
        }
    }
}
