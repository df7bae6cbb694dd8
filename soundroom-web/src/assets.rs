use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::audio::AudioBuffer;

/// Why an asset failed to load.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} while fetching {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode asset: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Audio,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Audio => "audio",
        }
    }
}

/// Identifies one outstanding load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// A fetch the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub id: RequestId,
    pub kind: AssetKind,
    pub url: String,
}

/// What came back for a request.
#[derive(Debug, Clone)]
pub enum AssetPayload {
    Progress { loaded: u64, total: Option<u64> },
    Model(ModelAsset),
    Audio(AudioBuffer),
    Failed(LoadError),
}

#[derive(Debug, Clone)]
pub struct AssetEvent {
    pub id: RequestId,
    pub payload: AssetPayload,
}

impl AssetEvent {
    pub fn new(id: RequestId, payload: AssetPayload) -> Self {
        Self { id, payload }
    }

    /// Whether this event finishes the request (anything but progress).
    pub fn is_terminal(&self) -> bool {
        !matches!(self.payload, AssetPayload::Progress { .. })
    }
}

/// Outbound queue of asset requests.
///
/// Scene setup enqueues requests synchronously; the host drains them,
/// fetches and decodes out of band, and hands results back as
/// [`AssetEvent`]s in whatever order they complete. There is no
/// cancellation or timeout: a request that never completes simply stays
/// in flight.
#[derive(Debug, Default)]
pub struct AssetQueue {
    next_id: u64,
    pending: Vec<AssetRequest>,
    in_flight: HashMap<RequestId, AssetRequest>,
}

impl AssetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, kind: AssetKind, url: impl Into<String>) -> RequestId {
        self.next_id += 1;
        let request = AssetRequest {
            id: RequestId(self.next_id),
            kind,
            url: url.into(),
        };
        log::debug!("Requesting {} {} as #{}", kind.label(), request.url, request.id.0);
        let id = request.id;
        self.pending.push(request);
        id
    }

    /// Hand every queued request to the host, in request order.
    pub fn drain_requests(&mut self) -> Vec<AssetRequest> {
        let drained: Vec<AssetRequest> = self.pending.drain(..).collect();
        for request in &drained {
            self.in_flight.insert(request.id, request.clone());
        }
        drained
    }

    /// Note that a terminal event arrived. Returns the original request if known.
    pub fn complete(&mut self, event: &AssetEvent) -> Option<AssetRequest> {
        if event.is_terminal() {
            self.pending.retain(|r| r.id != event.id);
            self.in_flight.remove(&event.id)
        } else {
            self.in_flight.get(&event.id).cloned()
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len() + self.pending.len()
    }
}

/// Mesh metadata carried by a model node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshInfo {
    pub primitives: usize,
    pub emissive_intensity: f32,
}

/// One node of a loaded model, before it is placed in a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub mesh: Option<MeshInfo>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshInfo) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ModelNode::count).sum::<usize>()
    }
}

/// A loaded model: a node-tree template rooted at a group.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub root: ModelNode,
}

impl ModelAsset {
    /// Import the node hierarchy of a glTF (JSON) or GLB (binary) file.
    ///
    /// Only names, transforms and mesh presence are kept; geometry and
    /// textures belong to the rendering library.
    pub fn from_gltf_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        let document = &gltf.document;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| LoadError::Decode("glTF file has no scenes".to_string()))?;

        let mut root = ModelNode::group(scene.name().unwrap_or("Scene"));
        for node in scene.nodes() {
            root.children.push(import_node(&node));
        }

        log::debug!(
            "Imported glTF scene '{}' with {} nodes",
            root.name,
            root.count() - 1
        );
        Ok(Self { root })
    }
}

fn import_node(node: &gltf::Node) -> ModelNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    ModelNode {
        name,
        position: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
        mesh: node.mesh().map(|m| MeshInfo {
            primitives: m.primitives().len(),
            emissive_intensity: 0.0,
        }),
        children: node.children().map(|c| import_node(&c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEAKER_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "name": "SpeakerScene", "nodes": [0] } ],
        "nodes": [
            { "name": "Speaker", "children": [1], "translation": [0.0, 0.5, 0.0] },
            { "name": "Cone", "scale": [2.0, 2.0, 2.0], "rotation": [0.0, 0.0, 0.0, 1.0] }
        ]
    }"#;

    #[test]
    fn test_queue_assigns_unique_ids_in_order() {
        let mut queue = AssetQueue::new();
        let a = queue.request(AssetKind::Model, "/models/stylised_room.glb");
        let b = queue.request(AssetKind::Audio, "/audio1.ogg");
        assert_ne!(a, b);

        let drained = queue.drain_requests();
        assert_eq!(drained.iter().map(|r| r.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(drained[1].kind, AssetKind::Audio);
        assert!(queue.drain_requests().is_empty());
        assert_eq!(queue.in_flight(), 2);
    }

    #[test]
    fn test_progress_does_not_complete_request() {
        let mut queue = AssetQueue::new();
        let id = queue.request(AssetKind::Model, "room.glb");
        queue.drain_requests();

        let progress = AssetEvent::new(id, AssetPayload::Progress { loaded: 10, total: Some(100) });
        assert!(queue.complete(&progress).is_some());
        assert_eq!(queue.in_flight(), 1);

        let failed = AssetEvent::new(id, AssetPayload::Failed(LoadError::NotFound("room.glb".into())));
        assert_eq!(queue.complete(&failed).map(|r| r.url), Some("room.glb".to_string()));
        assert_eq!(queue.in_flight(), 0);
    }

    #[test]
    fn test_import_gltf_hierarchy() {
        let model = ModelAsset::from_gltf_bytes(SPEAKER_GLTF.as_bytes()).unwrap();
        assert_eq!(model.root.name, "SpeakerScene");
        assert_eq!(model.root.children.len(), 1);

        let speaker = &model.root.children[0];
        assert_eq!(speaker.name, "Speaker");
        assert_eq!(speaker.position, Vec3::new(0.0, 0.5, 0.0));
        assert!(speaker.mesh.is_none());

        let cone = &speaker.children[0];
        assert_eq!(cone.name, "Cone");
        assert_eq!(cone.scale, Vec3::splat(2.0));
        assert_eq!(model.root.count(), 3);
    }

    #[test]
    fn test_import_garbage_is_decode_error() {
        let err = ModelAsset::from_gltf_bytes(b"definitely not gltf").unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }
}
