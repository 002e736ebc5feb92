//! Headless replay of a saved capture: the JSON fixture stands in for a live
//! source graph, and the standardize + recreate half of the pipeline runs
//! against it alone.

use std::path::PathBuf;

use material_forge::ir::{Capture, Direction};
use material_forge::recreate::Recreator;
use material_forge::scene::SceneGraph;
use material_forge::standardize::standardize;
use material_forge::value::Value;
use material_forge::vocab::{Renderer, SourceProfile, Vocabulary};

fn load_fixture() -> Capture {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/arnold_basic.json");
    Capture::load(path).expect("load arnold_basic fixture")
}

fn standardize_fixture(vocab: &Vocabulary) -> material_forge::MaterialData {
    standardize(
        &load_fixture(),
        vocab,
        Renderer::Arnold,
        SourceProfile::HostNodes,
        "arnold_materialbuilder_basic",
        "/mat/arnold_materialbuilder_basic",
    )
}

#[test]
fn usd_prim_ids_standardize_through_the_usd_profile() {
    let vocab = Vocabulary::load_default().unwrap();
    let capture = Capture::from_json(
        r#"{
            "tree": {
                "/materials/mat/image": {
                    "node_name": "image",
                    "node_path": "/materials/mat/image",
                    "node_type": "ND_image_color3",
                    "node_parms": [
                        { "name": "file", "type": "string", "direction": "input", "value": "a.exr" }
                    ]
                }
            },
            "outputs": {}
        }"#,
    )
    .unwrap();

    let data = standardize(
        &capture,
        &vocab,
        Renderer::Mtlx,
        SourceProfile::UsdPrims,
        "mat",
        "/materials/mat",
    );
    assert_eq!(data.nodes.len(), 1);
    assert_eq!(data.nodes[0].node_type.as_deref(), Some("GENERIC::image"));
    assert_eq!(data.nodes[0].parameters[0].generic_name, "filename");
}

#[test]
fn fixture_round_trips_through_serde() {
    let capture = load_fixture();
    let text = serde_json::to_string(&capture).unwrap();
    assert_eq!(Capture::from_json(&text).unwrap(), capture);
}

#[test]
fn parameters_survive_or_are_dropped_exactly_by_mapping() {
    let vocab = Vocabulary::load_default().unwrap();
    let data = standardize_fixture(&vocab);

    let surface = &data.nodes[data
        .index_of_path("/mat/arnold_materialbuilder_basic/standard_surface")
        .expect("surface standardized")];
    assert_eq!(
        surface.node_type.as_deref(),
        Some("GENERIC::standard_surface")
    );

    let find = |name: &str| {
        surface
            .parameters
            .iter()
            .find(|p| p.generic_name == name)
    };
    // Mapped parameters come through under their generic names, values
    // verbatim.
    assert_eq!(find("base").unwrap().value, Value::Float(0.8));
    assert_eq!(
        find("base_color").unwrap().value,
        Value::Tuple(vec![0.2, 0.4, 0.6])
    );
    assert_eq!(find("specular_roughness").unwrap().value, Value::Float(0.25));
    assert_eq!(find("shader").unwrap().direction, Direction::Output);

    // A raw name with no table entry is dropped, not renamed.
    assert!(
        surface
            .parameters
            .iter()
            .all(|p| p.generic_name != "aov_id1"),
        "unmapped parameter must not survive standardization"
    );

    // The fixture's unmapped names are exactly the ones absent.
    let vocab_table = vocab.param_table("arnold::standard_surface").unwrap();
    for raw_name in ["base", "base_color", "specular_roughness", "aov_id1", "shader"] {
        let mapped = vocab_table.contains_key(raw_name);
        let present = surface
            .parameters
            .iter()
            .any(|p| Some(p.generic_name.as_str()) == vocab_table.get(raw_name).map(String::as_str));
        assert_eq!(mapped, present, "presence of '{raw_name}' must follow the table");
    }
}

#[test]
fn fan_in_collapses_to_one_arena_entry_per_path() {
    let vocab = Vocabulary::load_default().unwrap();
    let data = standardize_fixture(&vocab);
    assert_eq!(data.nodes.len(), 3);

    let mut paths: Vec<&str> = data.nodes.iter().map(|n| n.node_path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), 3, "each source path appears exactly once");
}

#[test]
fn replayed_capture_recreates_a_materialx_network() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vocab = Vocabulary::load_default().unwrap();
    let data = standardize_fixture(&vocab);

    let mut graph = SceneGraph::new(vocab.catalog().clone());
    let mat = graph.create_root("mat", "mat");
    let builder = Recreator::new(&vocab, Renderer::Mtlx)
        .run(&mut graph, &data, mat)
        .expect("recreate from capture");

    let images = graph.children_of_type(builder, "mtlximage");
    assert_eq!(images.len(), 1);
    assert_eq!(
        graph.param_value(images[0], "file"),
        Some(&Value::String("diffuse.exr".into()))
    );
    // Position carried through from the capture.
    assert_eq!(graph.position(images[0]), Some([-4.0, 0.5]));

    let surfaces = graph.children_of_type(builder, "mtlxstandard_surface");
    assert_eq!(surfaces.len(), 1, "default surface is reused, not duplicated");
    let surface = surfaces[0];
    assert_eq!(
        graph.param_value(surface, "specular_roughness"),
        Some(&Value::Float(0.25))
    );

    // The texture drives base_color.
    let incoming = graph.input_connections(surface);
    assert!(
        incoming
            .iter()
            .any(|w| w.src_node == images[0] && w.dst_name == "base_color")
    );

    // The surface drives the surface output connector.
    let surface_output = graph
        .find_child(builder, "surface_output")
        .expect("skeleton connector");
    let driving = graph.input_connections(surface_output);
    assert_eq!(driving.len(), 1);
    assert_eq!(driving[0].src_node, surface);
}
