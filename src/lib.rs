//! material-forge translates shading networks between renderer vocabularies
//! (Arnold, MaterialX, Redshift, Principled Shader).
//!
//! A source network is captured by walking its DAG from the output sockets
//! upstream, normalized into a renderer-agnostic form through static
//! vocabulary tables, then rebuilt in a target renderer's vocabulary:
//!
//! ```text
//! source graph -> [Traverser] -> capture -> [standardize] -> MaterialData
//!              -> [Recreator] -> target graph
//! ```
//!
//! The raw capture serializes to JSON, so a conversion can also be replayed
//! headlessly from a saved capture instead of a live graph.

pub mod ir;
pub mod pipeline;
pub mod recreate;
pub mod scene;
pub mod standardize;
pub mod traverse;
pub mod value;
pub mod vocab;

pub use ir::{Capture, MaterialData, NodeInfo, NodeParameter};
pub use pipeline::{Conversion, Ingested, convert_all, convert_material, ingest_material, material_type_of};
pub use recreate::{RecreateOptions, Recreator};
pub use scene::{NodeId, SceneGraph};
pub use traverse::Traverser;
pub use value::{Value, ValueType};
pub use vocab::{Renderer, SourceProfile, Vocabulary};
