use crate::geometry::SphereGeometry;
use glam::Vec3;
use horizon_common::{Param, Transform};
use uuid::Uuid;

/// Unique identifier for an object in a scene layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// The three independently composited layers, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Space,
    Distortion,
    Overlay,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Space, LayerKind::Distortion, LayerKind::Overlay];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Space => "space",
            LayerKind::Distortion => "distortion",
            LayerKind::Overlay => "overlay",
        }
    }
}

/// Which faces of a mesh are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    /// Inside faces only, for enclosing spheres the camera sits in.
    Back,
}

/// Flat or textured surface material.
#[derive(Debug, Clone)]
pub struct MeshMaterial {
    pub color: [f32; 3],
    /// Resource name of an equirectangular texture.
    pub texture: Option<String>,
    pub side: Side,
    pub wireframe: Param<bool>,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            texture: None,
            side: Side::Front,
            wireframe: Param::new(false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: SphereGeometry,
    pub material: MeshMaterial,
}

/// Point sprite material. Sprite size scales with `view_height` so stars keep
/// their apparent size across window heights.
#[derive(Debug, Clone)]
pub struct PointsMaterial {
    pub view_height: Param<f32>,
    pub size_scale: f32,
    pub additive: bool,
}

impl PointsMaterial {
    pub fn new(view_height: f32) -> Self {
        Self {
            view_height: Param::new(view_height),
            size_scale: 1.0,
            additive: true,
        }
    }
}

/// Per-point attributes stored as parallel arrays.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub colors: Vec<[f32; 3]>,
    pub material: PointsMaterial,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum Renderable {
    Mesh(Mesh),
    Points(PointCloud),
}

/// An object owned by exactly one layer.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    /// When false the renderer never skips the object on view-frustum tests.
    pub frustum_culled: bool,
    pub body: Renderable,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, body: Renderable) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            frustum_culled: true,
            body,
        }
    }
}

/// Ordered, mutable collection of scene objects.
#[derive(Debug, Clone)]
pub struct SceneLayer {
    kind: LayerKind,
    objects: Vec<SceneObject>,
}

impl SceneLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            objects: Vec::new(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Append an object. Returns its id.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        tracing::trace!(layer = self.kind.name(), name = %object.name, "object added");
        self.objects.push(object);
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The `space`, `distortion` and `overlay` layers.
#[derive(Debug, Clone)]
pub struct SceneLayers {
    pub space: SceneLayer,
    pub distortion: SceneLayer,
    pub overlay: SceneLayer,
}

impl SceneLayers {
    pub fn new() -> Self {
        Self {
            space: SceneLayer::new(LayerKind::Space),
            distortion: SceneLayer::new(LayerKind::Distortion),
            overlay: SceneLayer::new(LayerKind::Overlay),
        }
    }

    pub fn layer(&self, kind: LayerKind) -> &SceneLayer {
        match kind {
            LayerKind::Space => &self.space,
            LayerKind::Distortion => &self.distortion,
            LayerKind::Overlay => &self.overlay,
        }
    }

    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut SceneLayer {
        match kind {
            LayerKind::Space => &mut self.space,
            LayerKind::Distortion => &mut self.distortion,
            LayerKind::Overlay => &mut self.overlay,
        }
    }

    /// Layers in composition order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneLayer> {
        [&self.space, &self.distortion, &self.overlay].into_iter()
    }

    pub fn object_count(&self) -> usize {
        self.iter().map(SceneLayer::len).sum()
    }
}

impl Default for SceneLayers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> SceneObject {
        SceneObject::new(
            "points",
            Renderable::Points(PointCloud {
                positions: vec![Vec3::ZERO; n],
                sizes: vec![1.0; n],
                colors: vec![[1.0; 3]; n],
                material: PointsMaterial::new(600.0),
            }),
        )
    }

    #[test]
    fn object_ids_are_unique() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn layers_start_empty_in_composition_order() {
        let layers = SceneLayers::new();
        let kinds: Vec<LayerKind> = layers.iter().map(SceneLayer::kind).collect();
        assert_eq!(kinds, LayerKind::ALL.to_vec());
        assert_eq!(layers.object_count(), 0);
    }

    #[test]
    fn add_get_remove() {
        let mut layers = SceneLayers::new();
        let id = layers.space.add(points(3));
        assert_eq!(layers.space.len(), 1);
        assert!(layers.distortion.get(id).is_none());

        layers.space.get_mut(id).unwrap().visible = false;
        assert!(!layers.space.get(id).unwrap().visible);

        let removed = layers.space.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(layers.space.is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut layer = SceneLayer::new(LayerKind::Overlay);
        let a = layer.add(points(1));
        let b = layer.add(points(2));
        let ids: Vec<ObjectId> = layer.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn layer_names() {
        assert_eq!(LayerKind::Distortion.name(), "distortion");
    }
}
