//! A toy train assembled from boxes and cylinders.

use std::{f32::consts::FRAC_PI_2, sync::Arc};

use crate::{
    data_structures::{
        geometry::Geometry,
        light::Light,
        material::{Color, Material},
        scene_graph::{Group, LightNode, Mesh, Scene},
    },
    flow::SceneFlow,
};

/// A static model: seven meshes grouped under one "train" node, lit by an
/// ambient light and two directional lights from opposite corners.
#[derive(Debug, Default)]
pub struct ToyTrain;

impl ToyTrain {
    pub fn new() -> Self {
        Self
    }

    /// The train model on its own, without lights.
    pub fn build_train() -> Group {
        let body = Arc::new(Material::standard(Color::from_hex(0xff3333)).with_flat_shading(true));
        let detail = Arc::new(Material::standard(Color::from_hex(0x333333)).with_flat_shading(true));

        let mut train = Group::new("train");

        let mut nose = Mesh::new(Arc::new(Geometry::cylinder_with_segments(0.75, 0.75, 3.0, 12)), body.clone())
            .named("nose");
        nose.transform.rotation.z = FRAC_PI_2;
        nose.transform.position.x = -1.0;

        let mut cabin = Mesh::new(Arc::new(Geometry::cuboid(2.0, 2.25, 1.5)), body).named("cabin");
        cabin.transform.set_position(1.5, 0.4, 0.0);

        train.add(nose).add(cabin);

        let mut wheel_geometry = Geometry::cylinder_with_segments(0.4, 0.4, 1.75, 16);
        wheel_geometry.rotate_x(FRAC_PI_2);

        let mut small_wheel_rear = Mesh::new(Arc::new(wheel_geometry), detail.clone()).named("small wheel rear");
        small_wheel_rear.transform.set_position(0.0, -0.5, 0.0);

        let mut small_wheel_center = small_wheel_rear.clone().named("small wheel center");
        small_wheel_center.transform.position.x = -1.0;

        let mut small_wheel_front = small_wheel_rear.clone().named("small wheel front");
        small_wheel_front.transform.position.x = -2.0;

        let mut big_wheel = small_wheel_rear.clone().named("big wheel");
        big_wheel.transform.set_scale(2.0, 2.0, 1.25);
        big_wheel.transform.set_position(1.5, -0.1, 0.0);

        train
            .add(small_wheel_rear)
            .add(small_wheel_center)
            .add(small_wheel_front)
            .add(big_wheel);

        let mut chimney = Mesh::new(Arc::new(Geometry::cylinder(0.3, 0.1, 0.5)), detail).named("chimney");
        chimney.transform.set_position(-2.0, 0.9, 0.0);
        train.add(chimney);

        train
    }
}

impl SceneFlow for ToyTrain {
    fn on_init(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        let white = Color::from_hex(0xffffff);
        scene.add(LightNode::new(Light::ambient(white, 1.0)));
        scene.add(LightNode::new(Light::directional(white, 1.0)).at(10.0, 10.0, 10.0));
        scene.add(LightNode::new(Light::directional(white, 1.0)).at(-10.0, 10.0, -10.0));

        scene.add(Self::build_train());
        Ok(())
    }
}
