//! Top-level conversion entry points.
//!
//! Both `ingest_material` and `convert_material` wrap their body in a
//! catch-all: failures are logged with their full context chain and surface
//! as `None`, never as a panic or a propagated error. Callers check for
//! `None` rather than relying on errors crossing this boundary.

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::ir::MaterialData;
use crate::recreate::{RecreateOptions, Recreator};
use crate::scene::{NodeId, SceneGraph};
use crate::standardize::standardize;
use crate::traverse::Traverser;
use crate::vocab::{Renderer, SourceProfile, Vocabulary};

/// A standardized material plus the renderer it came from.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub material_type: Renderer,
    pub data: MaterialData,
}

/// Outcome of one successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub material_type: Renderer,
    pub target: Renderer,
    pub builder: NodeId,
    pub builder_path: String,
}

/// Identify which renderer a material container belongs to. `None` means the
/// material is not convertible.
pub fn material_type_of(graph: &SceneGraph, material: NodeId) -> Option<Renderer> {
    let node = graph.node(material)?;
    match node.node_type.as_str() {
        "arnold_materialbuilder" => Some(Renderer::Arnold),
        "rs_usd_material_builder" => Some(Renderer::RedshiftVopnet),
        "principledshader::2.0" => Some(Renderer::PrincipledShader),
        "subnet" => graph
            .children(material)
            .iter()
            .any(|&c| graph.node(c).is_some_and(|n| n.node_type.contains("mtlx")))
            .then_some(Renderer::Mtlx),
        _ => None,
    }
}

fn try_ingest(
    graph: &SceneGraph,
    material: NodeId,
    material_type: Renderer,
    vocab: &Vocabulary,
) -> Result<MaterialData> {
    let capture = Traverser::new(vocab, material_type).run(graph, material)?;
    let name = graph
        .node(material)
        .map(|n| n.name.clone())
        .unwrap_or_default();
    let path = graph.path(material);
    Ok(standardize(
        &capture,
        vocab,
        material_type,
        SourceProfile::HostNodes,
        &name,
        &path,
    ))
}

/// Capture and standardize one material. Returns `None` (after logging) for
/// unrecognized material types and for any traversal failure.
pub fn ingest_material(
    graph: &SceneGraph,
    material: NodeId,
    vocab: &Vocabulary,
) -> Option<Ingested> {
    let Some(material_type) = material_type_of(graph, material) else {
        warn!(
            "could not determine material type of '{}'; only Arnold, MaterialX, Redshift and \
             Principled Shader sources are supported",
            graph.path(material)
        );
        return None;
    };

    match try_ingest(graph, material, material_type, vocab) {
        Ok(data) => Some(Ingested {
            material_type,
            data,
        }),
        Err(e) => {
            error!("ingest of '{}' failed: {e:#}", graph.path(material));
            None
        }
    }
}

/// Convert one material into `target`'s vocabulary, building the new network
/// under `target_parent`. Returns `None` (after logging) when ingestion or
/// recreation fails; the graph may then hold a partially built network.
pub fn convert_material(
    graph: &mut SceneGraph,
    material: NodeId,
    target_parent: NodeId,
    target: Renderer,
    options: &RecreateOptions,
    vocab: &Vocabulary,
) -> Option<Conversion> {
    let ingested = ingest_material(graph, material, vocab)?;

    let recreator = Recreator::new(vocab, target).with_options(options.clone());
    match recreator.run(graph, &ingested.data, target_parent) {
        Ok(builder) => {
            let builder_path = graph.path(builder);
            info!(
                "converted '{}' from '{}' to '{}' at '{builder_path}'",
                ingested.data.material_path,
                ingested.material_type.key(),
                target.key()
            );
            Some(Conversion {
                material_type: ingested.material_type,
                target,
                builder,
                builder_path,
            })
        }
        Err(e) => {
            error!(
                "recreation of '{}' as '{}' failed: {e:#}",
                ingested.data.material_path,
                target.key()
            );
            None
        }
    }
}

/// Convert every recognized material under `container`. Children that are
/// not materials are passed over; per-material failures yield a `None`
/// outcome without stopping the batch.
pub fn convert_all(
    graph: &mut SceneGraph,
    container: NodeId,
    target_parent: NodeId,
    target: Renderer,
    options: &RecreateOptions,
    vocab: &Vocabulary,
) -> Vec<(String, Option<Conversion>)> {
    let children: Vec<NodeId> = graph.children(container).to_vec();
    let mut outcomes = Vec::new();
    for child in children {
        let name = graph
            .node(child)
            .map(|n| n.name.clone())
            .unwrap_or_default();
        if material_type_of(graph, child).is_none() {
            debug!("'{name}' is not a recognized material, passing over");
            continue;
        }
        let outcome = convert_material(graph, child, target_parent, target, options, vocab);
        outcomes.push((name, outcome));
    }
    outcomes
}
