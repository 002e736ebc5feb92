//! Principled-style single-node shaders: the virtual 2-node tree, the
//! optional synthetic image, and rejection of unknown material types.

use material_forge::pipeline::{convert_material, ingest_material, material_type_of};
use material_forge::recreate::RecreateOptions;
use material_forge::scene::{NodeId, SceneGraph};
use material_forge::value::Value;
use material_forge::vocab::{Renderer, Vocabulary};

fn principled_source(vocab: &Vocabulary, texture: Option<&str>) -> (SceneGraph, NodeId, NodeId) {
    let mut graph = SceneGraph::new(vocab.catalog().clone());
    let mat = graph.create_root("mat", "mat");
    let shader = graph.create_node(mat, "principledshader::2.0", "principledshader1");
    graph
        .set_param(shader, "basecolor", Value::Tuple(vec![0.9, 0.1, 0.1]))
        .unwrap();
    if let Some(path) = texture {
        graph
            .set_param(shader, "basecolor_useTexture", Value::Bool(true))
            .unwrap();
        graph
            .set_param(shader, "basecolor_texture", Value::String(path.into()))
            .unwrap();
    }
    (graph, mat, shader)
}

#[test]
fn untextured_shader_standardizes_to_two_nodes() {
    let vocab = Vocabulary::load_default().unwrap();
    let (graph, _mat, shader) = principled_source(&vocab, None);

    let ingested = ingest_material(&graph, shader, &vocab).unwrap();
    assert_eq!(ingested.material_type, Renderer::PrincipledShader);
    assert_eq!(ingested.data.nodes.len(), 2, "synthetic output + surface only");
    assert!(
        ingested
            .data
            .nodes
            .iter()
            .all(|n| n.node_type.as_deref() != Some("GENERIC::image"))
    );
    assert!(ingested.data.output_connections.contains_key("GENERIC::output_surface"));
}

#[test]
fn untextured_shader_recreates_without_image_nodes() {
    let vocab = Vocabulary::load_default().unwrap();
    let (mut graph, mat, shader) = principled_source(&vocab, None);

    let conversion = convert_material(
        &mut graph,
        shader,
        mat,
        Renderer::Mtlx,
        &RecreateOptions::default(),
        &vocab,
    )
    .unwrap();

    assert!(graph.children_of_type(conversion.builder, "mtlximage").is_empty());
    let surface_output = graph.find_child(conversion.builder, "surface_output").unwrap();
    let driving = graph.input_connections(surface_output);
    assert_eq!(driving.len(), 1);
    assert_eq!(
        graph.node(driving[0].src_node).unwrap().node_type,
        "mtlxstandard_surface"
    );
}

#[test]
fn textured_shader_gains_a_synthetic_image_child() {
    let vocab = Vocabulary::load_default().unwrap();
    let (mut graph, mat, shader) =
        principled_source(&vocab, Some("F:/assets/textures/albedo.png"));

    let ingested = ingest_material(&graph, shader, &vocab).unwrap();
    assert_eq!(ingested.data.nodes.len(), 3);

    let conversion = convert_material(
        &mut graph,
        shader,
        mat,
        Renderer::Mtlx,
        &RecreateOptions {
            texture_dir: Some("/show/tex".into()),
        },
        &vocab,
    )
    .unwrap();

    let images = graph.children_of_type(conversion.builder, "mtlximage");
    assert_eq!(images.len(), 1);
    assert_eq!(
        graph.param_value(images[0], "file"),
        Some(&Value::String("/show/tex/albedo.png".into())),
        "texture directory is rebased, basename kept"
    );

    let surface = graph.children_of_type(conversion.builder, "mtlxstandard_surface")[0];
    assert!(
        graph
            .input_connections(surface)
            .iter()
            .any(|w| w.src_node == images[0] && w.dst_name == "base_color")
    );
}

#[test]
fn unknown_material_type_converts_to_nothing() {
    let vocab = Vocabulary::load_default().unwrap();
    let mut graph = SceneGraph::new(vocab.catalog().clone());
    let mat = graph.create_root("mat", "mat");
    let stranger = graph.create_node(mat, "karma_material", "karma1");

    assert_eq!(material_type_of(&graph, stranger), None);

    let before = graph.children(mat).len();
    let outcome = convert_material(
        &mut graph,
        stranger,
        mat,
        Renderer::Mtlx,
        &RecreateOptions::default(),
        &vocab,
    );
    assert!(outcome.is_none());
    assert_eq!(
        graph.children(mat).len(),
        before,
        "a failed conversion creates no target nodes"
    );
}
