//! Empty target-network skeletons, one per renderer, shaped the way the
//! host's own material builders come up: pre-built output sockets and, where
//! the host ships one, a default surface node the reuse policy repurposes.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::scene::{NodeId, SceneGraph};
use crate::value::Value;
use crate::vocab::{GENERIC_OUTPUT_DISPLACEMENT, GENERIC_OUTPUT_SURFACE, Renderer};

use super::RunState;

/// Create the target container and its canonical output sockets.
pub(crate) fn create(
    graph: &mut SceneGraph,
    target: Renderer,
    parent: NodeId,
    material_name: &str,
) -> Result<RunState> {
    let (builder, surface, displacement) = match target {
        Renderer::Arnold => {
            let builder = graph.create_node(parent, "arnold_materialbuilder", material_name);
            let out = graph.create_node(builder, "arnold_material", "OUT_material");
            (builder, Some(out), Some(out))
        }
        Renderer::Mtlx => create_mtlx_builder(graph, parent, material_name)?,
        Renderer::RedshiftVopnet => {
            let builder = graph.create_node(parent, "rs_usd_material_builder", material_name);
            let out = graph.create_node(builder, "redshift_material", "redshift_material1");
            let surface =
                graph.create_node(builder, "redshift::StandardMaterial", "StandardMaterial1");
            graph.connect(surface, 0, out, 0)?;
            (builder, Some(out), Some(out))
        }
        Renderer::PrincipledShader => {
            let builder = graph.create_node(parent, "principledshader::2.0", material_name);
            (builder, None, None)
        }
    };

    Ok(RunState {
        builder,
        output_handles: BTreeMap::from([
            (GENERIC_OUTPUT_SURFACE.to_string(), surface),
            (GENERIC_OUTPUT_DISPLACEMENT.to_string(), displacement),
        ]),
        old_new_map: Default::default(),
        claimed: Default::default(),
        splitters: Default::default(),
    })
}

/// A MaterialX builder subnet: one connector per output slot plus the
/// default surface and displacement shaders wired into them.
fn create_mtlx_builder(
    graph: &mut SceneGraph,
    parent: NodeId,
    material_name: &str,
) -> Result<(NodeId, Option<NodeId>, Option<NodeId>)> {
    let builder = graph.create_node(parent, "subnet", material_name);

    let surface_output = graph.create_node(builder, "subnetconnector", "surface_output");
    graph.set_param(surface_output, "parmname", Value::String("surface".into()))?;
    graph.set_param(surface_output, "parmlabel", Value::String("Surface".into()))?;
    graph.set_param(surface_output, "parmtype", Value::String("surface".into()))?;

    let displacement_output = graph.create_node(builder, "subnetconnector", "displacement_output");
    graph.set_param(displacement_output, "parmname", Value::String("displacement".into()))?;
    graph.set_param(displacement_output, "parmlabel", Value::String("Displacement".into()))?;
    graph.set_param(displacement_output, "parmtype", Value::String("displacement".into()))?;

    let surface = graph.create_node(builder, "mtlxstandard_surface", "mtlxstandard_surface");
    graph.connect(surface, 0, surface_output, 0)?;

    let displacement = graph.create_node(builder, "mtlxdisplacement", "mtlxdisplacement");
    graph.connect(displacement, 0, displacement_output, 0)?;

    Ok((builder, Some(surface_output), Some(displacement_output)))
}
