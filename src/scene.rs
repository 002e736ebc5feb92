//! In-process scene graph the pipeline reads from and writes into.
//!
//! This is the "host" side of the conversion: containers and shader nodes
//! addressed by id and slash path, typed parameters, and index/name-addressed
//! wires between output and input ports. Port layouts for well-known node
//! types come from the vocabulary's node catalog; unknown types simply have
//! no declared ports.

use std::collections::HashMap;

use anyhow::{Result, bail};

use crate::value::{Value, ValueType, shape_matches};
use crate::vocab::NodeCatalog;

pub type NodeId = u32;

/// One typed parameter stored on a node.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
    pub value: Value,
}

/// A node in the scene: a container (material builder, subnet) or a shader.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub node_type: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub params: Vec<Param>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub position: Option<[f32; 2]>,
}

/// A directed wire from an output port to an input port.
#[derive(Debug, Clone)]
pub struct Wire {
    pub src_node: NodeId,
    pub src_index: usize,
    pub src_name: String,
    pub dst_node: NodeId,
    pub dst_index: usize,
    pub dst_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    wires: Vec<Wire>,
    roots: Vec<NodeId>,
    next_id: NodeId,
    catalog: NodeCatalog,
}

impl SceneGraph {
    pub fn new(catalog: NodeCatalog) -> Self {
        SceneGraph {
            catalog,
            ..Default::default()
        }
    }

    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    fn alloc(&mut self, node_type: &str, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;

        let name = match parent {
            Some(p) => self.unique_child_name(p, name),
            None => name.to_string(),
        };
        let (inputs, outputs) = match self.catalog.ports(node_type) {
            Some(ports) => (ports.inputs.clone(), ports.outputs.clone()),
            None => (Vec::new(), Vec::new()),
        };

        self.nodes.insert(
            id,
            SceneNode {
                id,
                name,
                node_type: node_type.to_string(),
                parent,
                children: Vec::new(),
                params: Vec::new(),
                inputs,
                outputs,
                position: None,
            },
        );
        match parent {
            Some(p) => self.nodes.get_mut(&p).expect("parent exists").children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Hosts keep sibling names unique by suffixing a counter.
    fn unique_child_name(&self, parent: NodeId, want: &str) -> String {
        if self.find_child(parent, want).is_none() {
            return want.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{want}{n}");
            if self.find_child(parent, &candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Create a top-level container (e.g. `/mat`).
    pub fn create_root(&mut self, node_type: &str, name: &str) -> NodeId {
        self.alloc(node_type, name, None)
    }

    /// Create a node inside a container. The final name may differ from the
    /// requested one when a sibling already uses it.
    pub fn create_node(&mut self, parent: NodeId, node_type: &str, name: &str) -> NodeId {
        self.alloc(node_type, name, Some(parent))
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[&c].name == name)
    }

    pub fn children_of_type(&self, parent: NodeId, node_type: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| self.nodes[&c].node_type == node_type)
            .collect()
    }

    /// Slash path from the root, e.g. `/mat/builder/image_diffuse`.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let node = &self.nodes[&c];
            segments.push(node.name.clone());
            cursor = node.parent;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub fn node_by_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.trim_start_matches('/').split('/');
        let first = segments.next()?;
        let mut cursor = self
            .roots
            .iter()
            .copied()
            .find(|&r| self.nodes[&r].name == first)?;
        for segment in segments {
            cursor = self.find_child(cursor, segment)?;
        }
        Some(cursor)
    }

    // -- parameters ---------------------------------------------------------

    pub fn params(&self, id: NodeId) -> &[Param] {
        self.nodes.get(&id).map(|n| n.params.as_slice()).unwrap_or(&[])
    }

    pub fn param(&self, id: NodeId, name: &str) -> Option<&Param> {
        self.params(id).iter().find(|p| p.name == name)
    }

    pub fn param_value(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.param(id, name).map(|p| &p.value)
    }

    /// Set a parameter. When the node's catalog entry declares a type for it,
    /// the value must already have that shape; mismatches are an error the
    /// caller decides how to handle.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: Value) -> Result<()> {
        let Some(node) = self.nodes.get_mut(&id) else {
            bail!("no node with id {id}");
        };
        let declared = self.catalog.param_type(&node.node_type, name);
        if let Some(want) = declared {
            if !shape_matches(&value, want) {
                bail!(
                    "parameter '{name}' on '{}' expects {want}, got {value:?}",
                    node.name
                );
            }
        }
        let ty = declared.unwrap_or_else(|| ValueType::infer(&value));
        match node.params.iter_mut().find(|p| p.name == name) {
            Some(param) => {
                param.ty = ty;
                param.value = value;
            }
            None => node.params.push(Param {
                name: name.to_string(),
                ty,
                value,
            }),
        }
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, position: [f32; 2]) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.position = Some(position);
        }
    }

    pub fn position(&self, id: NodeId) -> Option<[f32; 2]> {
        self.nodes.get(&id).and_then(|n| n.position)
    }

    // -- wiring -------------------------------------------------------------

    fn port_name(names: &[String], index: usize, prefix: &str) -> String {
        names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("{prefix}{index}"))
    }

    /// Wire `src`'s output port into `dst`'s input port. An existing wire
    /// into the same input is replaced, hosts allow only one.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_index: usize,
        dst: NodeId,
        dst_index: usize,
    ) -> Result<()> {
        if src == dst {
            bail!("cannot wire a node into itself");
        }
        let Some(src_node) = self.nodes.get(&src) else {
            bail!("no source node with id {src}");
        };
        let Some(dst_node) = self.nodes.get(&dst) else {
            bail!("no destination node with id {dst}");
        };
        let src_name = Self::port_name(&src_node.outputs, src_index, "out");
        let dst_name = Self::port_name(&dst_node.inputs, dst_index, "in");

        self.wires
            .retain(|w| !(w.dst_node == dst && w.dst_index == dst_index));
        self.wires.push(Wire {
            src_node: src,
            src_index,
            src_name,
            dst_node: dst,
            dst_index,
            dst_name,
        });
        Ok(())
    }

    /// Wires feeding `id`'s inputs.
    pub fn input_connections(&self, id: NodeId) -> Vec<&Wire> {
        self.wires.iter().filter(|w| w.dst_node == id).collect()
    }

    /// Wires leaving `id`'s outputs.
    pub fn output_connections(&self, id: NodeId) -> Vec<&Wire> {
        self.wires.iter().filter(|w| w.src_node == id).collect()
    }

    pub fn input_index(&self, id: NodeId, name: &str) -> Option<usize> {
        self.nodes.get(&id)?.inputs.iter().position(|p| p == name)
    }

    pub fn output_index(&self, id: NodeId, name: &str) -> Option<usize> {
        self.nodes.get(&id)?.outputs.iter().position(|p| p == name)
    }

    /// Whether any wire between children of `container` feeds `id`'s output
    /// into another node. Used to find the sinks of a material network.
    pub fn feeds_any_sibling(&self, container: NodeId, id: NodeId) -> bool {
        let siblings = self.children(container);
        self.wires
            .iter()
            .any(|w| w.src_node == id && siblings.contains(&w.dst_node))
    }
}
