use std::sync::Arc;

use crate::{
    data_structures::{
        geometry::Geometry,
        light::Light,
        material::{Color, Material},
        scene_graph::{LightNode, Mesh, NodeId, Scene},
    },
    flow::SceneFlow,
    time::FrameTime,
};

/// Radians added to each rotation axis per frame.
pub const SPIN_PER_FRAME: f32 = 0.01;

/// A purple 2x2x2 cube lit from above the camera side, turning on all three
/// axes a fixed step per frame.
#[derive(Debug, Default)]
pub struct SpinningCube {
    cube: Option<NodeId>,
}

impl SpinningCube {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cube(&self) -> Option<NodeId> {
        self.cube
    }
}

impl SceneFlow for SpinningCube {
    fn on_init(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        let cube = Mesh::new(
            Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
            Arc::new(Material::standard(Color::from_hex(0x800080))),
        )
        .named("cube");
        self.cube = Some(scene.add(cube));

        scene.add(LightNode::new(Light::directional(Color::from_hex(0xffffff), 3.0)).at(0.0, 3.0, 3.0));
        Ok(())
    }

    fn on_update(&mut self, scene: &mut Scene, _time: FrameTime) {
        let Some(node) = self.cube.and_then(|id| scene.get_mut(id)) else {
            return;
        };
        let rotation = &mut node.transform_mut().rotation;
        rotation.x += SPIN_PER_FRAME;
        rotation.y += SPIN_PER_FRAME;
        rotation.z += SPIN_PER_FRAME;
    }
}
