//! Conversions out of a MaterialX builder subnet, including the
//! null-fallback for generic types the target has no equivalent for.

use material_forge::pipeline::{convert_material, material_type_of};
use material_forge::recreate::RecreateOptions;
use material_forge::scene::{NodeId, SceneGraph};
use material_forge::value::Value;
use material_forge::vocab::{Renderer, Vocabulary};

fn mtlx_source(vocab: &Vocabulary, with_displacement: bool) -> (SceneGraph, NodeId, NodeId) {
    let mut graph = SceneGraph::new(vocab.catalog().clone());
    let mat = graph.create_root("mat", "mat");
    let builder = graph.create_node(mat, "subnet", "mtlxmaterial_basic");

    let surface_output = graph.create_node(builder, "subnetconnector", "surface_output");
    graph
        .set_param(surface_output, "parmname", Value::String("surface".into()))
        .unwrap();

    let surface = graph.create_node(builder, "mtlxstandard_surface", "mtlxstandard_surface");
    graph
        .set_param(surface, "base_color", Value::Tuple(vec![0.7, 0.7, 0.2]))
        .unwrap();
    graph.set_param(surface, "metalness", Value::Float(1.0)).unwrap();

    let image = graph.create_node(builder, "mtlximage", "image_basecolor");
    graph
        .set_param(image, "file", Value::String("basecolor.png".into()))
        .unwrap();

    graph.connect(image, 0, surface, 1).unwrap(); // out -> base_color
    graph.connect(surface, 0, surface_output, 0).unwrap();

    if with_displacement {
        let displacement_output =
            graph.create_node(builder, "subnetconnector", "displacement_output");
        graph
            .set_param(
                displacement_output,
                "parmname",
                Value::String("displacement".into()),
            )
            .unwrap();
        let displacement = graph.create_node(builder, "mtlxdisplacement", "mtlxdisplacement");
        graph.connect(displacement, 0, displacement_output, 0).unwrap();
    }

    (graph, mat, builder)
}

#[test]
fn subnet_with_mtlx_children_is_detected_as_materialx() {
    let vocab = Vocabulary::load_default().unwrap();
    let (graph, _mat, builder) = mtlx_source(&vocab, false);
    assert_eq!(material_type_of(&graph, builder), Some(Renderer::Mtlx));
}

#[test]
fn mtlx_network_rebuilds_under_an_arnold_builder() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vocab = Vocabulary::load_default().unwrap();
    let (mut graph, mat, builder) = mtlx_source(&vocab, false);

    let conversion = convert_material(
        &mut graph,
        builder,
        mat,
        Renderer::Arnold,
        &RecreateOptions::default(),
        &vocab,
    )
    .expect("mtlx to arnold conversion");

    let target = conversion.builder;
    let surfaces = graph.children_of_type(target, "arnold::standard_surface");
    assert_eq!(surfaces.len(), 1);
    assert_eq!(
        graph.param_value(surfaces[0], "metalness"),
        Some(&Value::Float(1.0))
    );

    let images = graph.children_of_type(target, "arnold::image");
    assert_eq!(images.len(), 1);
    assert_eq!(
        graph.param_value(images[0], "filename"),
        Some(&Value::String("basecolor.png".into())),
        "mtlx 'file' lands on arnold 'filename' through the generic pivot"
    );
    assert!(
        graph
            .input_connections(surfaces[0])
            .iter()
            .any(|w| w.src_node == images[0] && w.dst_name == "base_color")
    );

    let out = graph.find_child(target, "OUT_material").unwrap();
    let driving = graph.input_connections(out);
    assert_eq!(driving.len(), 1);
    assert_eq!(driving[0].src_node, surfaces[0]);
    assert_eq!(driving[0].dst_index, 0, "surface wires into slot 0");
}

#[test]
fn displacement_without_an_arnold_equivalent_falls_back_to_null() {
    let vocab = Vocabulary::load_default().unwrap();
    let (mut graph, mat, builder) = mtlx_source(&vocab, true);

    let conversion = convert_material(
        &mut graph,
        builder,
        mat,
        Renderer::Arnold,
        &RecreateOptions::default(),
        &vocab,
    )
    .unwrap();

    let target = conversion.builder;
    let nulls = graph.children_of_type(target, "null");
    assert_eq!(nulls.len(), 1, "unmappable displacement becomes a null node");

    let out = graph.find_child(target, "OUT_material").unwrap();
    assert!(
        graph
            .input_connections(out)
            .iter()
            .any(|w| w.src_node == nulls[0] && w.dst_index == 1),
        "displacement still wires into slot 1"
    );
}
