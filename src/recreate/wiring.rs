//! Wiring of the recreated network: inter-node edges (with channel-split
//! synthesis) and the final root output connections.

use log::{debug, warn};

use crate::ir::{MaterialData, RawConnection, RawEndpoint};
use crate::scene::{NodeId, SceneGraph};
use crate::vocab::{Renderer, Vocabulary};

use super::RunState;

/// Vector-to-scalar splitter synthesized for per-channel routing.
const SPLIT_NODE_TYPE: &str = "mtlxseparate3c";

/// Full-vector selectors that never need splitting.
const FULL_VECTOR_PARMS: [&str; 3] = ["rgb", "rgba", "out"];

/// Wire every recorded connection whose destination is not an output node.
pub(crate) fn wire_nodes(
    vocab: &Vocabulary,
    target: Renderer,
    graph: &mut SceneGraph,
    data: &MaterialData,
    state: &mut RunState,
) {
    let output_ids = state.output_ids();
    for index in data.ordered_indices() {
        for connection in data.node(index).connection_info.values() {
            wire_connection(vocab, target, graph, state, &output_ids, connection);
        }
    }
}

fn wire_connection(
    vocab: &Vocabulary,
    target: Renderer,
    graph: &mut SceneGraph,
    state: &mut RunState,
    output_ids: &[NodeId],
    connection: &RawConnection,
) {
    let Some(src) = state.old_new_map.get(&connection.input.node_path) else {
        warn!(
            "source '{}' was never materialized, skipping edge",
            connection.input.node_path
        );
        return;
    };
    let Some(dst) = state.old_new_map.get(&connection.output.node_path) else {
        warn!(
            "destination '{}' was never materialized, skipping edge",
            connection.output.node_path
        );
        return;
    };
    let (src_id, src_name) = (src.id, src.name.clone());
    let (dst_id, dst_name) = (dst.id, dst.name.clone());

    // Edges into the root output sockets are handled by the output-wiring
    // step; wiring them here would double-connect.
    if output_ids.contains(&dst_id) {
        debug!(
            "skipping edge into output node '{}'",
            connection.output.node_name
        );
        return;
    }

    let dst_index = match graph.input_index(dst_id, &connection.output.parm_name) {
        Some(index) => index,
        None => {
            warn!(
                "'{}' has no input named '{}', falling back to index 0",
                dst_name, connection.output.parm_name
            );
            0
        }
    };

    let src_type = graph
        .node(src_id)
        .map(|n| n.node_type.clone())
        .unwrap_or_default();
    if vocab.needs_channel_split(target, &src_type)
        && !FULL_VECTOR_PARMS.contains(&connection.input.parm_name.as_str())
    {
        split_channel(graph, state, &connection.input, src_id, dst_id, dst_index);
        return;
    }

    let src_index = graph
        .output_index(src_id, &connection.input.parm_name)
        .unwrap_or(0);
    if let Err(e) = graph.connect(src_id, src_index, dst_id, dst_index) {
        warn!("failed to connect '{src_name}' to '{dst_name}': {e}");
    }
}

/// Route one scalar channel of a vector-valued source through a splitter
/// node. The splitter is created once per distinct source node (keyed by
/// source path) and shared across destination channels.
fn split_channel(
    graph: &mut SceneGraph,
    state: &mut RunState,
    src_endpoint: &RawEndpoint,
    src_id: NodeId,
    dst_id: NodeId,
    dst_index: usize,
) {
    let channel = src_endpoint.parm_name.as_str();
    if !matches!(channel, "r" | "g" | "b") {
        warn!(
            "channel splitting supports 'r', 'g' and 'b', got '{channel}' from '{}'",
            src_endpoint.node_name
        );
        return;
    }

    let splitter = match state.splitters.get(&src_endpoint.node_path).copied() {
        Some(id) => id,
        None => {
            let src_name = graph
                .node(src_id)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            let id = graph.create_node(
                state.builder,
                SPLIT_NODE_TYPE,
                &format!("{src_name}_split_vec3"),
            );
            if let Err(e) = graph.connect(src_id, 0, id, 0) {
                warn!("failed to feed splitter for '{src_name}': {e}");
            }
            state.splitters.insert(src_endpoint.node_path.clone(), id);
            id
        }
    };

    let out_index = graph
        .output_index(splitter, &format!("out{channel}"))
        .unwrap_or(0);
    if let Err(e) = graph.connect(splitter, out_index, dst_id, dst_index) {
        warn!("failed to connect splitter channel '{channel}': {e}");
    }
}

/// Connect each generic output slot's driving node into the target output
/// socket at the renderer's fixed index.
pub(crate) fn wire_outputs(
    vocab: &Vocabulary,
    target: Renderer,
    graph: &mut SceneGraph,
    data: &MaterialData,
    state: &RunState,
) {
    for (slot, handle) in &state.output_handles {
        let Some(handle) = handle else {
            continue;
        };
        let Some(record) = data.output_connections.get(slot) else {
            debug!("source drives no '{slot}' output");
            continue;
        };
        let Some(slot_index) = vocab.output_slot_index(target, slot) else {
            warn!("no output slot index for '{slot}' in '{}'", target.key());
            continue;
        };
        let Some(driver) = state.old_new_map.get(&record.connected_node_path) else {
            warn!(
                "output driver '{}' was never materialized",
                record.connected_node_path
            );
            continue;
        };
        if driver.id == *handle {
            continue;
        }
        let src_index = graph
            .output_index(driver.id, &record.connected_output_name)
            .unwrap_or(0);
        if let Err(e) = graph.connect(driver.id, src_index, *handle, slot_index) {
            warn!("failed to wire '{slot}': {e}");
        }
    }
}
