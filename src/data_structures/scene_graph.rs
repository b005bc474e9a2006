//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] owns an ordered list of top-level nodes and a background color.
//! Nodes implement [`SceneNode`]: meshes and lights are leaves, a [`Group`]
//! owns children and passes its transform down to them. Each frame the graph
//! is flattened by [`Scene::traverse`] into world-space draw items and lights
//! for the renderer.

use std::{fmt::Debug, sync::Arc};

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{
    data_structures::{
        geometry::Geometry,
        instance::Transform,
        light::{Light, LightKind},
        material::{Color, Material},
    },
    render::{DrawItem, FrameItems, LightItem},
};

pub trait SceneNode: Debug {
    fn name(&self) -> &str;

    fn transform(&self) -> &Transform;

    fn transform_mut(&mut self) -> &mut Transform;

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &[]
    }

    fn as_mesh(&self) -> Option<&Mesh> {
        None
    }

    fn as_light(&self) -> Option<&Light> {
        None
    }
}

/// A drawable pairing of shared geometry and shared material.
///
/// Cloning a mesh is cheap: the clone shares geometry and material and only
/// copies the transform, so the copy can be moved independently.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            name: String::new(),
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl SceneNode for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn as_mesh(&self) -> Option<&Mesh> {
        Some(self)
    }
}

/// A positionable container used to compose a model from several meshes.
#[derive(Debug, Default)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, child: impl SceneNode + 'static) -> &mut Self {
        self.children.push(Box::new(child));
        self
    }
}

impl SceneNode for Group {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }
}

/// A light placed in the scene graph; its transform sets the light's position.
#[derive(Clone, Debug)]
pub struct LightNode {
    pub light: Light,
    pub transform: Transform,
}

impl LightNode {
    pub fn new(light: Light) -> Self {
        Self {
            light,
            transform: Transform::default(),
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.set_position(x, y, z);
        self
    }
}

impl SceneNode for LightNode {
    fn name(&self) -> &str {
        match self.light.kind {
            LightKind::Ambient => "ambient light",
            LightKind::Directional { .. } => "directional light",
        }
    }

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn as_light(&self) -> Option<&Light> {
        Some(&self.light)
    }
}

/// Index of a top-level node, handed out by [`Scene::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct Scene {
    pub background: Color,
    nodes: Vec<Box<dyn SceneNode>>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            nodes: Vec::new(),
        }
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    pub fn add(&mut self, node: impl SceneNode + 'static) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    pub fn add_boxed(&mut self, node: Box<dyn SceneNode>) -> NodeId {
        log::debug!("adding node '{}' to the scene", node.name());
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn SceneNode> {
        self.nodes.get(id.0).map(|node| node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Box<dyn SceneNode>> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> &[Box<dyn SceneNode>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flattens the graph into world-space meshes and lights, in insertion
    /// order (depth first).
    pub fn traverse(&self) -> FrameItems<'_> {
        let mut items = FrameItems::default();
        let root = Matrix4::identity();
        for node in &self.nodes {
            collect(node.as_ref(), &root, &mut items);
        }
        items
    }
}

fn collect<'a>(node: &'a dyn SceneNode, parent: &Matrix4<f32>, items: &mut FrameItems<'a>) {
    let world = parent * node.transform().to_matrix();
    if let Some(mesh) = node.as_mesh() {
        items.draws.push(DrawItem { mesh, world });
    }
    if let Some(light) = node.as_light() {
        items.lights.push(LightItem {
            light,
            position: Vector3::new(world.w.x, world.w.y, world.w.z),
        });
    }
    for child in node.children() {
        collect(child.as_ref(), &world, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    fn unit_mesh() -> Mesh {
        Mesh::new(
            Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
            Arc::new(Material::basic()),
        )
    }

    #[test]
    fn nested_groups_compose_transforms() {
        let mut inner = Group::new("inner");
        inner.transform.set_position(0.0, 1.0, 0.0);
        let mut mesh = unit_mesh();
        mesh.transform.set_position(0.0, 0.0, 1.0);
        inner.add(mesh);
        let mut outer = Group::new("outer");
        outer.transform.set_position(1.0, 0.0, 0.0);
        outer.add(inner);

        let mut scene = Scene::new(Color::from_hex(0x000000));
        scene.add(outer);
        let items = scene.traverse();
        assert_eq!(items.draws.len(), 1);
        let origin = items.draws[0].world * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.truncate() - Vector3::new(1.0, 1.0, 1.0)).magnitude() < 1e-6);
    }

    #[test]
    fn light_position_comes_from_its_world_transform() {
        let mut scene = Scene::new(Color::from_hex(0x000000));
        let mut rig = Group::new("rig");
        rig.transform.set_position(0.0, 5.0, 0.0);
        rig.add(LightNode::new(Light::directional(Color::from_hex(0xffffff), 1.0)).at(10.0, 0.0, 0.0));
        scene.add(rig);
        let items = scene.traverse();
        assert_eq!(items.lights.len(), 1);
        assert_eq!(items.lights[0].position, Vector3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn cloned_mesh_shares_geometry_but_not_transform() {
        let original = unit_mesh();
        let mut copy = original.clone();
        copy.transform.position.x = -1.0;
        assert!(Arc::ptr_eq(&original.geometry, &copy.geometry));
        assert_eq!(original.transform.position.x, 0.0);
    }

    #[test]
    fn node_ids_follow_insertion_order() {
        let mut scene = Scene::new(Color::from_hex(0x8fbcd4));
        let first = scene.add(unit_mesh().named("first"));
        let second = scene.add(unit_mesh().named("second"));
        assert_eq!(scene.get(first).map(|n| n.name()), Some("first"));
        assert_eq!(scene.get(second).map(|n| n.name()), Some("second"));
        assert_eq!(scene.len(), 2);
    }
}
