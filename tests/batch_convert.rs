//! Batch conversion over a container of mixed children.

use material_forge::pipeline::convert_all;
use material_forge::recreate::RecreateOptions;
use material_forge::scene::SceneGraph;
use material_forge::value::Value;
use material_forge::vocab::{Renderer, Vocabulary};

#[test]
fn convert_all_handles_every_recognized_material_and_passes_over_the_rest() {
    let vocab = Vocabulary::load_default().unwrap();
    let mut graph = SceneGraph::new(vocab.catalog().clone());
    let mat = graph.create_root("mat", "mat");

    // One Arnold material.
    let arnold = graph.create_node(mat, "arnold_materialbuilder", "arnold_mat");
    let out = graph.create_node(arnold, "arnold_material", "OUT_material");
    let surface = graph.create_node(arnold, "arnold::standard_surface", "standard_surface");
    graph.set_param(surface, "metalness", Value::Float(0.5)).unwrap();
    graph.connect(surface, 0, out, 0).unwrap();

    // One Principled shader.
    let principled = graph.create_node(mat, "principledshader::2.0", "principled_mat");
    graph
        .set_param(principled, "rough", Value::Float(0.4))
        .unwrap();

    // One bystander that is no material at all.
    graph.create_node(mat, "null", "not_a_material");

    let materials = graph.create_root("materials", "materials");
    let outcomes = convert_all(
        &mut graph,
        mat,
        materials,
        Renderer::Mtlx,
        &RecreateOptions::default(),
        &vocab,
    );

    assert_eq!(outcomes.len(), 2, "only recognized materials are attempted");
    assert!(outcomes.iter().all(|(_, outcome)| outcome.is_some()));
    assert_eq!(graph.children(materials).len(), 2);

    let names: Vec<&str> = outcomes.iter().map(|(name, _)| name.as_str()).collect();
    assert!(names.contains(&"arnold_mat"));
    assert!(names.contains(&"principled_mat"));
}
