//! Materialization of standardized nodes inside the target builder: type
//! translation, the reuse-before-create policy, and parameter application.

use log::{debug, info, warn};

use crate::ir::{Direction, MaterialData, NodeInfo};
use crate::scene::{NodeId, SceneGraph};
use crate::value::{Value, coerce};
use crate::vocab::{
    GENERIC_IMAGE, GENERIC_NULL, GENERIC_OUTPUT_NODE, Renderer, SourceProfile, Vocabulary,
};

use super::{MappedNode, RecreateOptions, RunState};

/// Create (or repurpose) one target node per standardized record. The arena
/// holds each source path once, so every record is handled exactly once;
/// output-node records are skipped, their sockets exist since the skeleton
/// step.
pub(crate) fn materialize(
    vocab: &Vocabulary,
    target: Renderer,
    options: &RecreateOptions,
    graph: &mut SceneGraph,
    data: &MaterialData,
    state: &mut RunState,
) {
    for index in data.ordered_indices() {
        let node = data.node(index);
        if node.node_type.as_deref() == Some(GENERIC_OUTPUT_NODE) {
            continue;
        }
        create_or_reuse(vocab, target, options, graph, state, node);
    }
}

fn create_or_reuse(
    vocab: &Vocabulary,
    target: Renderer,
    options: &RecreateOptions,
    graph: &mut SceneGraph,
    state: &mut RunState,
    node: &NodeInfo,
) {
    let generic = node.node_type.as_deref().unwrap_or(GENERIC_NULL);
    let Some(target_type) =
        vocab.renderer_node_type_or_null(target, SourceProfile::HostNodes, generic)
    else {
        warn!(
            "no target type for '{generic}' in '{}', skipping '{}'",
            target.key(),
            node.node_path
        );
        return;
    };
    let target_type = target_type.to_string();

    // Skeletons ship pre-built nodes (e.g. a default standard surface);
    // repurpose an unclaimed one of the right type instead of duplicating it.
    let existing = graph
        .children(state.builder)
        .iter()
        .copied()
        .find(|&c| {
            graph.node(c).is_some_and(|n| n.node_type == target_type) && !state.claimed.contains(&c)
        });

    let id = match existing {
        Some(id) => {
            info!(
                "reusing existing '{}' node for '{}'",
                target_type, node.node_path
            );
            id
        }
        None => graph.create_node(state.builder, &target_type, &node.node_name),
    };
    state.claimed.insert(id);
    if let Some(position) = node.position {
        graph.set_position(id, position);
    }

    apply_parameters(vocab, options, graph, id, &target_type, node);

    let created = graph.node(id).expect("created node exists");
    state.old_new_map.insert(
        node.node_path.clone(),
        MappedNode {
            name: created.name.clone(),
            path: graph.path(id),
            id,
        },
    );
}

fn apply_parameters(
    vocab: &Vocabulary,
    options: &RecreateOptions,
    graph: &mut SceneGraph,
    id: NodeId,
    target_type: &str,
    node: &NodeInfo,
) {
    if node.parameters.is_empty() {
        debug!("no parameters to apply to '{}'", node.node_path);
        return;
    }
    if vocab.param_table(target_type).is_none() {
        warn!("no parameter mappings for target type '{target_type}'");
        return;
    }

    for param in &node.parameters {
        if param.direction == Direction::Output || param.value == Value::None {
            continue;
        }
        let Some(raw_name) = vocab.renderer_param_name(target_type, &param.generic_name) else {
            warn!(
                "no '{target_type}' parameter for generic '{}', skipping",
                param.generic_name
            );
            continue;
        };
        let raw_name = raw_name.to_string();

        let mut value = param.value.clone();
        if let Some(dir) = &options.texture_dir {
            if node.node_type.as_deref() == Some(GENERIC_IMAGE) && param.generic_name == "filename"
            {
                value = rebase_texture_path(value, dir);
            }
        }

        if let Some(want) = graph.catalog().param_type(target_type, &raw_name) {
            value = match coerce(value, want) {
                Ok(v) => v,
                Err(e) => {
                    warn!("skipping '{raw_name}' on '{}': {e}", node.node_path);
                    continue;
                }
            };
        }

        if let Err(e) = graph.set_param(id, &raw_name, value) {
            warn!("failed to set '{raw_name}': {e}");
        }
    }
}

/// Swap the directory of a texture path, keeping the basename.
fn rebase_texture_path(value: Value, dir: &str) -> Value {
    let Value::String(path) = &value else {
        return value;
    };
    let basename = path.rsplit(['/', '\\']).next().unwrap_or(path);
    Value::String(format!("{}/{}", dir.trim_end_matches('/'), basename))
}
