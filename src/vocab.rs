//! The renderer vocabulary registry: bidirectional node-type and
//! parameter-name tables pivoting through the `GENERIC::` namespace.
//!
//! Tables are compiled-in configuration (`assets/vocabulary.json`), parsed
//! once into a [`Vocabulary`] and passed explicitly into the traverser,
//! standardizer and recreator so tests can inject alternate tables.

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use serde::Deserialize;

use crate::value::ValueType;

const DEFAULT_VOCABULARY_JSON: &str = include_str!("../assets/vocabulary.json");

pub const GENERIC_OUTPUT_NODE: &str = "GENERIC::output_node";
pub const GENERIC_NULL: &str = "GENERIC::null";
pub const GENERIC_IMAGE: &str = "GENERIC::image";
pub const GENERIC_OUTPUT_SURFACE: &str = "GENERIC::output_surface";
pub const GENERIC_OUTPUT_DISPLACEMENT: &str = "GENERIC::output_displacement";

/// Prefix a raw output slot name (`surface`, `displacement`) into the
/// generic output key used by the standardized output map.
pub fn generic_output_key(slot: &str) -> String {
    format!("GENERIC::output_{slot}")
}

/// A renderer vocabulary the pipeline can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renderer {
    Arnold,
    Mtlx,
    RedshiftVopnet,
    PrincipledShader,
}

impl Renderer {
    pub fn key(&self) -> &'static str {
        match self {
            Renderer::Arnold => "arnold",
            Renderer::Mtlx => "mtlx",
            Renderer::RedshiftVopnet => "redshift_vopnet",
            Renderer::PrincipledShader => "principledshader",
        }
    }

    /// Resolve a renderer key string. Unknown strings resolve to `None`;
    /// callers treat that as "unsupported material type".
    pub fn from_key(key: &str) -> Option<Renderer> {
        match key {
            "arnold" => Some(Renderer::Arnold),
            "mtlx" => Some(Renderer::Mtlx),
            "redshift_vopnet" => Some(Renderer::RedshiftVopnet),
            "principledshader" => Some(Renderer::PrincipledShader),
            _ => None,
        }
    }
}

/// Which half of the node-type table applies to a source graph: host node
/// vocabularies (`arnold::image`) or USD prim ids (`arnold:image`,
/// `ND_image_color3`). Resolved once at traversal start, never per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceProfile {
    #[default]
    HostNodes,
    UsdPrims,
}

// ---------------------------------------------------------------------------
// Raw asset schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct RawVocabulary {
    renderers: HashMap<String, RawRendererVocab>,
    /// `renderer-qualified node type -> {raw parameter -> generic parameter}`.
    /// Keys use the single-colon form; lookups normalize `::` to `:`.
    param_names: HashMap<String, HashMap<String, String>>,
    /// `renderer -> {generic output key -> input index on the sink}`.
    output_slot_indices: HashMap<String, HashMap<String, usize>>,
    /// Target-side node types whose outputs are single channels that scalar
    /// destinations can only consume through an explicit splitter.
    #[serde(default)]
    split_source_types: HashMap<String, Vec<String>>,
    /// Port/parameter metadata for well-known renderer node types.
    #[serde(default)]
    node_catalog: HashMap<String, RawNodePorts>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRendererVocab {
    /// `profile -> {renderer node type -> generic node type}`.
    node_types: HashMap<String, HashMap<String, String>>,
    /// The sink node type this renderer reads its final shader from.
    #[serde(default)]
    output_node_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawNodePorts {
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    param_types: HashMap<String, ValueType>,
}

// ---------------------------------------------------------------------------
// Compiled registry
// ---------------------------------------------------------------------------

/// Port and parameter metadata for the node types a host knows how to build.
///
/// Unknown node types are legal everywhere: they simply have no ports, which
/// downstream wiring treats as "fall back to index 0".
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    ports: HashMap<String, NodePorts>,
}

#[derive(Debug, Clone, Default)]
pub struct NodePorts {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub param_types: HashMap<String, ValueType>,
}

impl NodeCatalog {
    pub fn ports(&self, node_type: &str) -> Option<&NodePorts> {
        self.ports.get(node_type)
    }

    pub fn input_index(&self, node_type: &str, name: &str) -> Option<usize> {
        self.ports(node_type)?.inputs.iter().position(|p| p == name)
    }

    pub fn output_index(&self, node_type: &str, name: &str) -> Option<usize> {
        self.ports(node_type)?.outputs.iter().position(|p| p == name)
    }

    pub fn param_type(&self, node_type: &str, name: &str) -> Option<ValueType> {
        self.ports(node_type)?.param_types.get(name).copied()
    }
}

#[derive(Debug, Clone, Default)]
struct RendererVocab {
    to_generic: HashMap<SourceProfile, HashMap<String, String>>,
    from_generic: HashMap<SourceProfile, HashMap<String, String>>,
    output_node_type: Option<String>,
}

/// The loaded vocabulary registry. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    renderers: HashMap<Renderer, RendererVocab>,
    param_names: HashMap<String, HashMap<String, String>>,
    output_slot_indices: HashMap<Renderer, HashMap<String, usize>>,
    split_source_types: HashMap<Renderer, Vec<String>>,
    catalog: NodeCatalog,
}

/// Lookups key parameter tables by the single-colon type form, so host node
/// types (`arnold::image`) and USD ids (`arnold:image`) share one table.
fn param_table_key(node_type: &str) -> String {
    node_type.replace("::", ":")
}

fn parse_profile(key: &str) -> Result<SourceProfile> {
    match key {
        "host_nodes" => Ok(SourceProfile::HostNodes),
        "usd_prims" => Ok(SourceProfile::UsdPrims),
        other => bail!("unknown source profile in vocabulary asset: {other}"),
    }
}

impl Vocabulary {
    /// Parse the compiled-in vocabulary asset.
    pub fn load_default() -> Result<Vocabulary> {
        Self::from_json(DEFAULT_VOCABULARY_JSON)
    }

    /// Parse a vocabulary from JSON text. Reverse maps are built here in one
    /// sweep; the tables are immutable afterwards.
    pub fn from_json(text: &str) -> Result<Vocabulary> {
        let raw: RawVocabulary = serde_json::from_str(text)
            .map_err(|e| anyhow!("failed to parse vocabulary json: {e}"))?;

        let mut renderers = HashMap::new();
        for (renderer_key, raw_vocab) in raw.renderers {
            let renderer = Renderer::from_key(&renderer_key)
                .ok_or_else(|| anyhow!("unknown renderer in vocabulary asset: {renderer_key}"))?;

            let mut vocab = RendererVocab {
                output_node_type: raw_vocab.output_node_type,
                ..Default::default()
            };
            for (profile_key, table) in raw_vocab.node_types {
                let profile = parse_profile(&profile_key)?;
                // Two specific types may share one generic tag; build the
                // reverse map over sorted keys so the winner is stable.
                let mut specific_types: Vec<&String> = table.keys().collect();
                specific_types.sort();
                let mut reverse: HashMap<String, String> = HashMap::new();
                for specific in specific_types {
                    reverse.insert(table[specific].clone(), specific.clone());
                }
                vocab.to_generic.insert(profile, table);
                vocab.from_generic.insert(profile, reverse);
            }
            renderers.insert(renderer, vocab);
        }

        let mut output_slot_indices = HashMap::new();
        for (renderer_key, table) in raw.output_slot_indices {
            let renderer = Renderer::from_key(&renderer_key)
                .ok_or_else(|| anyhow!("unknown renderer in output slot table: {renderer_key}"))?;
            output_slot_indices.insert(renderer, table);
        }

        let mut split_source_types = HashMap::new();
        for (renderer_key, types) in raw.split_source_types {
            let renderer = Renderer::from_key(&renderer_key)
                .ok_or_else(|| anyhow!("unknown renderer in split table: {renderer_key}"))?;
            split_source_types.insert(renderer, types);
        }

        let catalog = NodeCatalog {
            ports: raw
                .node_catalog
                .into_iter()
                .map(|(ty, p)| {
                    (
                        ty,
                        NodePorts {
                            inputs: p.inputs,
                            outputs: p.outputs,
                            param_types: p.param_types,
                        },
                    )
                })
                .collect(),
        };

        Ok(Vocabulary {
            renderers,
            param_names: raw.param_names,
            output_slot_indices,
            split_source_types,
            catalog,
        })
    }

    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    fn renderer(&self, renderer: Renderer) -> Option<&RendererVocab> {
        self.renderers.get(&renderer)
    }

    /// The sink node type this renderer reads its final shader from, if it
    /// has a discrete one.
    pub fn output_node_type(&self, renderer: Renderer) -> Option<&str> {
        self.renderer(renderer)?.output_node_type.as_deref()
    }

    /// `renderer node type -> generic node type`.
    pub fn generic_node_type(
        &self,
        renderer: Renderer,
        profile: SourceProfile,
        node_type: &str,
    ) -> Option<&str> {
        self.renderer(renderer)?
            .to_generic
            .get(&profile)?
            .get(node_type)
            .map(String::as_str)
    }

    /// `generic node type -> renderer node type`, no fallback.
    pub fn renderer_node_type(
        &self,
        renderer: Renderer,
        profile: SourceProfile,
        generic: &str,
    ) -> Option<&str> {
        self.renderer(renderer)?
            .from_generic
            .get(&profile)?
            .get(generic)
            .map(String::as_str)
    }

    /// `generic node type -> renderer node type`, falling back to the
    /// renderer's null-equivalent type when no mapping exists.
    pub fn renderer_node_type_or_null(
        &self,
        renderer: Renderer,
        profile: SourceProfile,
        generic: &str,
    ) -> Option<&str> {
        self.renderer_node_type(renderer, profile, generic)
            .or_else(|| self.renderer_node_type(renderer, profile, GENERIC_NULL))
    }

    /// The raw-to-generic parameter table for a renderer node type, if one
    /// exists.
    pub fn param_table(&self, node_type: &str) -> Option<&HashMap<String, String>> {
        self.param_names.get(&param_table_key(node_type))
    }

    /// `raw parameter name -> generic parameter name` for a node type.
    pub fn generic_param_name(&self, node_type: &str, raw: &str) -> Option<&str> {
        self.param_table(node_type)?.get(raw).map(String::as_str)
    }

    /// `generic parameter name -> raw parameter name`, looked up by value the
    /// way recreation needs it.
    pub fn renderer_param_name(&self, node_type: &str, generic: &str) -> Option<&str> {
        self.param_table(node_type)?
            .iter()
            .find(|(_, v)| v.as_str() == generic)
            .map(|(k, _)| k.as_str())
    }

    /// Input index on the renderer's sink node for a generic output key.
    pub fn output_slot_index(&self, renderer: Renderer, generic_output: &str) -> Option<usize> {
        self.output_slot_indices.get(&renderer)?.get(generic_output).copied()
    }

    /// Whether a target-side node type needs an explicit splitter to expose
    /// single channels of its vector output.
    pub fn needs_channel_split(&self, renderer: Renderer, node_type: &str) -> bool {
        self.split_source_types
            .get(&renderer)
            .is_some_and(|types| types.iter().any(|t| t == node_type))
    }

    /// Every (renderer, profile) node-type table, for exhaustive checks.
    pub fn node_type_tables(
        &self,
    ) -> impl Iterator<Item = (Renderer, SourceProfile, &HashMap<String, String>)> {
        self.renderers.iter().flat_map(|(renderer, vocab)| {
            let renderer = *renderer;
            vocab
                .to_generic
                .iter()
                .map(move |(profile, table)| (renderer, *profile, table))
        })
    }
}
