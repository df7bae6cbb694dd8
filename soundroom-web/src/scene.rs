use glam::{Mat4, Quat, Vec3};

use crate::assets::{MeshInfo, ModelAsset, ModelNode};
use crate::audio::PositionalAudio;
use crate::camera::PerspectiveCamera;
use crate::label::TextLabel;
use crate::renderer::EnvironmentMap;

/// Index of a node in a [`SceneGraph`]. Stable for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node is, beyond its transform.
#[derive(Debug)]
pub enum NodeKind {
    Group,
    Camera(PerspectiveCamera),
    Mesh(MeshInfo),
    AudioListener,
    PositionalAudio(PositionalAudio),
    TextLabel(TextLabel),
    ControllerRay,
    ControllerGrip,
    ControllerModel,
}

/// Local transform of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A node in the scene graph.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: TransformState,
    pub visible: bool,
    pub world_transform: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed scene graph.
///
/// Nodes are never freed; a node created with [`SceneGraph::spawn`] is
/// detached until it is added under another node. Only nodes reachable
/// from [`SceneGraph::root`] are rendered.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
    pub background: [f32; 3],
    pub environment: Option<EnvironmentMap>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            background: [0.0; 3],
            environment: None,
        };
        graph.root = graph.spawn("scene", NodeKind::Group);
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached node.
    pub fn spawn(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            kind,
            transform: TransformState::default(),
            visible: true,
            world_transform: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Attach `child` under `parent`, detaching it from its previous parent.
    ///
    /// Returns `false` (and leaves the graph untouched) if the move would
    /// create a cycle.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || self.is_ancestor(child, parent) {
            log::warn!(
                "Refusing to add '{}' under its own descendant '{}'",
                self.nodes[child.0].name,
                self.nodes[parent.0].name
            );
            return false;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        true
    }

    /// Remove `id` from its parent's children. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Whether `ancestor` is on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.nodes[id.0].parent;
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.nodes[p.0].parent;
        }
        false
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        self.nodes[id.0].transform.position = position;
    }

    pub fn set_uniform_scale(&mut self, id: NodeId, scale: f32) {
        self.nodes[id.0].transform.scale = Vec3::splat(scale);
    }

    /// Translation part of the cached world matrix.
    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.nodes[id.0].world_transform.w_axis.truncate()
    }

    /// First attached-or-not node with this name, in creation order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// All node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Depth-first walk of the subtree under `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    pub fn camera(&self, id: NodeId) -> Option<&PerspectiveCamera> {
        match &self.nodes[id.0].kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Option<&mut PerspectiveCamera> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn positional_audio(&self, id: NodeId) -> Option<&PositionalAudio> {
        match &self.nodes[id.0].kind {
            NodeKind::PositionalAudio(a) => Some(a),
            _ => None,
        }
    }

    pub fn positional_audio_mut(&mut self, id: NodeId) -> Option<&mut PositionalAudio> {
        match &mut self.nodes[id.0].kind {
            NodeKind::PositionalAudio(a) => Some(a),
            _ => None,
        }
    }

    /// Build a detached copy of a loaded model and return its root.
    pub fn instantiate(&mut self, model: &ModelAsset) -> NodeId {
        self.instantiate_node(&model.root)
    }

    fn instantiate_node(&mut self, template: &ModelNode) -> NodeId {
        let kind = match &template.mesh {
            Some(mesh) => NodeKind::Mesh(mesh.clone()),
            None => NodeKind::Group,
        };
        let id = self.spawn(template.name.clone(), kind);
        self.nodes[id.0].transform = TransformState {
            position: template.position,
            rotation: template.rotation,
            scale: template.scale,
        };
        for child in &template.children {
            let child_id = self.instantiate_node(child);
            self.add(id, child_id);
        }
        id
    }
}
