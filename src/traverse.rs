//! Capture of a source shader network: sink detection per renderer plus the
//! recursive upstream walk that records nodes, parameters and connections.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use log::warn;

use crate::ir::{Capture, Direction, OutputMap, OutputRecord, RawConnection, RawEndpoint, RawNode, RawParam, RawTree};
use crate::scene::{NodeId, SceneGraph};
use crate::value::{Value, ValueType};
use crate::vocab::{Renderer, SourceProfile, Vocabulary};

/// Walks a material network from its sink(s) upstream and produces a
/// [`Capture`]: the nested node tree plus the output-socket map.
pub struct Traverser<'a> {
    vocab: &'a Vocabulary,
    renderer: Renderer,
    profile: SourceProfile,
}

impl<'a> Traverser<'a> {
    pub fn new(vocab: &'a Vocabulary, renderer: Renderer) -> Self {
        Traverser {
            vocab,
            renderer,
            profile: SourceProfile::default(),
        }
    }

    /// Select which half of the vocabulary applies to this source graph.
    /// Resolved here once, never re-detected per node.
    pub fn with_profile(mut self, profile: SourceProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> SourceProfile {
        self.profile
    }

    /// Capture the network under `material`.
    pub fn run(&self, graph: &SceneGraph, material: NodeId) -> Result<Capture> {
        let outputs = self.detect_output_nodes(graph, material)?;

        if self.renderer == Renderer::PrincipledShader {
            let tree = self.build_principled_tree(graph, material);
            return Ok(Capture { tree, outputs });
        }

        // Every child that feeds no sibling is a sink; walk upstream from
        // each and merge the trees.
        let mut tree = RawTree::new();
        for &child in graph.children(material) {
            if graph.feeds_any_sibling(material, child) {
                continue;
            }
            let node = self.traverse_node(graph, child, None, &outputs);
            tree.insert(node.node_path.clone(), node);
        }
        Ok(Capture { tree, outputs })
    }

    // -- output detection ---------------------------------------------------

    /// Locate the sink node(s) for this renderer and record which upstream
    /// node drives each output slot.
    pub fn detect_output_nodes(&self, graph: &SceneGraph, material: NodeId) -> Result<OutputMap> {
        match self.renderer {
            Renderer::Arnold | Renderer::RedshiftVopnet => self.detect_single_sink(graph, material),
            Renderer::Mtlx => Ok(self.detect_connector_sinks(graph, material)),
            Renderer::PrincipledShader => Ok(self.synthesize_principled_outputs(graph, material)),
        }
    }

    /// Arnold and Redshift read one multi-input sink; its absence is fatal.
    fn detect_single_sink(&self, graph: &SceneGraph, material: NodeId) -> Result<OutputMap> {
        let sink_type = self
            .vocab
            .output_node_type(self.renderer)
            .unwrap_or_default()
            .to_string();
        let Some(sink) = graph
            .children(material)
            .iter()
            .copied()
            .find(|&c| graph.node(c).is_some_and(|n| n.node_type == sink_type))
        else {
            bail!(
                "no output node of type '{sink_type}' under '{}'",
                graph.path(material)
            );
        };

        let sink_node = graph.node(sink).expect("sink exists");
        let mut outputs = OutputMap::new();
        for wire in graph.input_connections(sink) {
            let slot = match wire.dst_index {
                0 => "surface",
                1 => "displacement",
                _ => continue,
            };
            let driver = graph.node(wire.src_node).expect("wire source exists");
            outputs.insert(
                slot.to_string(),
                OutputRecord {
                    node_name: sink_node.name.clone(),
                    node_path: graph.path(sink),
                    connected_node_name: driver.name.clone(),
                    connected_node_path: graph.path(wire.src_node),
                    connected_input_index: Some(wire.src_index),
                    connected_input_name: wire.dst_name.clone(),
                    connected_output_name: wire.src_name.clone(),
                },
            );
        }
        Ok(outputs)
    }

    /// MaterialX uses one single-purpose connector per slot; zero or partial
    /// slots are tolerated.
    fn detect_connector_sinks(&self, graph: &SceneGraph, material: NodeId) -> OutputMap {
        let connector_type = self.vocab.output_node_type(self.renderer).unwrap_or_default();
        let mut outputs = OutputMap::new();
        for connector in graph.children_of_type(material, connector_type) {
            let slot = match graph.param_value(connector, "parmname").and_then(Value::as_str) {
                Some(s @ ("surface" | "displacement")) => s.to_string(),
                _ => continue,
            };
            let Some(wire) = graph.input_connections(connector).first().copied().cloned() else {
                continue;
            };
            let connector_node = graph.node(connector).expect("connector exists");
            let driver = graph.node(wire.src_node).expect("wire source exists");
            outputs.insert(
                slot,
                OutputRecord {
                    node_name: connector_node.name.clone(),
                    node_path: graph.path(connector),
                    connected_node_name: driver.name.clone(),
                    connected_node_path: graph.path(wire.src_node),
                    connected_input_index: Some(wire.src_index),
                    connected_input_name: wire.dst_name.clone(),
                    connected_output_name: wire.src_name.clone(),
                },
            );
        }
        outputs
    }

    /// A Principled-style shader has no real network; fabricate the surface
    /// record a 2-node graph would have produced.
    fn synthesize_principled_outputs(&self, graph: &SceneGraph, material: NodeId) -> OutputMap {
        let base = graph.path(material);
        let mut outputs = OutputMap::new();
        outputs.insert(
            "surface".to_string(),
            OutputRecord {
                node_name: "OUT_material".to_string(),
                node_path: format!("{base}/OUT_material"),
                connected_node_name: "standard_surface".to_string(),
                connected_node_path: format!("{base}/standard_surface"),
                connected_input_index: Some(0),
                connected_input_name: "surface".to_string(),
                connected_output_name: "shader".to_string(),
            },
        );
        outputs
    }

    // -- recursive descent --------------------------------------------------

    fn capture_params(&self, graph: &SceneGraph, node: NodeId) -> Vec<RawParam> {
        let scene_node = graph.node(node).expect("node exists");
        let mut parms: Vec<RawParam> = scene_node
            .params
            .iter()
            .map(|p| RawParam {
                name: p.name.clone(),
                param_type: p.ty,
                direction: Direction::Input,
                value: p.value.clone(),
            })
            .collect();
        for out in &scene_node.outputs {
            let param_type = graph
                .catalog()
                .param_type(&scene_node.node_type, out)
                .unwrap_or(ValueType::Float);
            parms.push(RawParam {
                name: out.clone(),
                param_type,
                direction: Direction::Output,
                value: Value::None,
            });
        }
        parms
    }

    /// The subset of `node`'s outward connections whose destination is its
    /// immediate consumer, so each edge is attributed exactly once.
    fn capture_connections(
        &self,
        graph: &SceneGraph,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> BTreeMap<String, RawConnection> {
        let Some(parent) = parent else {
            return BTreeMap::new();
        };
        let this = graph.node(node).expect("node exists");
        let consumer = graph.node(parent).expect("parent exists");

        let mut connections = BTreeMap::new();
        for (i, wire) in graph.output_connections(node).iter().enumerate() {
            if wire.dst_node != parent {
                continue;
            }
            connections.insert(
                format!("connection_{i}"),
                RawConnection {
                    input: RawEndpoint {
                        node_name: this.name.clone(),
                        node_path: graph.path(node),
                        node_type: this.node_type.clone(),
                        node_index: wire.src_index,
                        parm_name: wire.src_name.clone(),
                    },
                    output: RawEndpoint {
                        node_name: consumer.name.clone(),
                        node_path: graph.path(parent),
                        node_type: consumer.node_type.clone(),
                        node_index: wire.dst_index,
                        parm_name: wire.dst_name.clone(),
                    },
                },
            );
        }
        connections
    }

    fn traverse_node(
        &self,
        graph: &SceneGraph,
        node: NodeId,
        parent: Option<NodeId>,
        outputs: &OutputMap,
    ) -> RawNode {
        let path = graph.path(node);
        let output_type = outputs
            .iter()
            .find(|(_, record)| record.node_path == path)
            .map(|(slot, _)| slot.clone());
        let scene_node = graph.node(node).expect("node exists");

        let mut raw = RawNode {
            node_name: scene_node.name.clone(),
            node_path: path,
            node_type: scene_node.node_type.clone(),
            node_parms: self.capture_params(graph, node),
            connections_dict: self.capture_connections(graph, node, parent),
            children_list: Vec::new(),
            is_output_node: output_type.is_some(),
            output_type,
            node_position: scene_node.position,
        };

        for wire in graph.input_connections(node) {
            let child = self.traverse_node(graph, wire.src_node, Some(node), outputs);
            raw.children_list.push(child);
        }
        raw
    }

    // -- principled synthetic tree ------------------------------------------

    /// Build the virtual 2-node tree for a single-node shader: a synthetic
    /// output wrapping a synthetic standard surface, plus a synthetic image
    /// node only when the base-color texture parameter is populated.
    fn build_principled_tree(&self, graph: &SceneGraph, material: NodeId) -> RawTree {
        let base = graph.path(material);
        let out_path = format!("{base}/OUT_material");
        let surface_path = format!("{base}/standard_surface");

        let mut surface = RawNode {
            node_name: "standard_surface".to_string(),
            node_path: surface_path.clone(),
            node_type: "arnold::standard_surface".to_string(),
            node_parms: Vec::new(),
            connections_dict: BTreeMap::from([(
                "connection_0".to_string(),
                RawConnection {
                    input: RawEndpoint {
                        node_name: "standard_surface".to_string(),
                        node_path: surface_path.clone(),
                        node_type: "arnold::standard_surface".to_string(),
                        node_index: 0,
                        parm_name: "shader".to_string(),
                    },
                    output: RawEndpoint {
                        node_name: "OUT_material".to_string(),
                        node_path: out_path.clone(),
                        node_type: "arnold_material".to_string(),
                        node_index: 0,
                        parm_name: "surface".to_string(),
                    },
                },
            )]),
            children_list: Vec::new(),
            is_output_node: false,
            output_type: None,
            node_position: None,
        };

        let use_texture = graph
            .param_value(material, "basecolor_useTexture")
            .is_some_and(Value::is_truthy);
        let texture = graph
            .param_value(material, "basecolor_texture")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if use_texture && !texture.is_empty() {
            let image_path = format!("{base}/image_diffuse");
            surface.children_list.push(RawNode {
                node_name: "image_diffuse".to_string(),
                node_path: image_path.clone(),
                node_type: "arnold::image".to_string(),
                node_parms: vec![RawParam {
                    name: "filename".to_string(),
                    param_type: ValueType::String,
                    direction: Direction::Input,
                    value: Value::String(texture),
                }],
                connections_dict: BTreeMap::from([(
                    "connection_0".to_string(),
                    RawConnection {
                        input: RawEndpoint {
                            node_name: "image_diffuse".to_string(),
                            node_path: image_path,
                            node_type: "arnold::image".to_string(),
                            node_index: 0,
                            parm_name: "rgba".to_string(),
                        },
                        output: RawEndpoint {
                            node_name: "standard_surface".to_string(),
                            node_path: surface_path.clone(),
                            node_type: "arnold::standard_surface".to_string(),
                            node_index: 1,
                            parm_name: "base_color".to_string(),
                        },
                    },
                )]),
                children_list: Vec::new(),
                is_output_node: false,
                output_type: None,
                node_position: None,
            });
        } else if use_texture {
            warn!("base color texture toggle set but path empty on '{base}'");
        }

        let out = RawNode {
            node_name: "OUT_material".to_string(),
            node_path: out_path.clone(),
            node_type: "arnold_material".to_string(),
            node_parms: Vec::new(),
            connections_dict: BTreeMap::new(),
            children_list: vec![surface],
            is_output_node: true,
            output_type: Some("surface".to_string()),
            node_position: None,
        };

        RawTree::from([(out_path, out)])
    }
}
