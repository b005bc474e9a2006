use std::sync::Arc;

use scene_bootstrap::{
    LogicalSize, WindowEvent,
    bootstrap::SceneContext,
    cgmath::{EuclideanSpace, MetricSpace, Point3, Vector3},
    config::SceneConfig,
    data_structures::{
        geometry::Geometry,
        material::Material,
        scene_graph::{Group, Mesh, Scene},
    },
    flow::SceneFlow,
    flows::{SpinningCube, ToyTrain, cube::SPIN_PER_FRAME},
    render::Renderer,
};

use crate::common::test_utils::{FixedSurface, FlowCounter, RecordingRenderer};

mod common;

fn bootstrap(
    surface: &FixedSurface,
    flow: Box<dyn SceneFlow>,
) -> SceneContext<RecordingRenderer> {
    SceneContext::initialize(surface, RecordingRenderer::new(), flow, &SceneConfig::default())
        .expect("bootstrapping with a recording renderer cannot fail")
}

#[test]
fn camera_aspect_matches_the_surface_after_initialize() {
    let surface = FixedSurface::new(800.0, 600.0).with_ratio(2.0);
    let ctx = bootstrap(&surface, Box::new(SpinningCube::new()));

    assert!((ctx.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!(ctx.renderer().size(), surface.size);
    assert_eq!(ctx.renderer().pixel_ratio(), 2.0);
    let physical = ctx.renderer().physical_size();
    assert_eq!((physical.width, physical.height), (1600, 1200));
    assert!(ctx.is_playing());
}

#[test]
fn configured_pixel_ratio_overrides_the_surface() {
    let surface = FixedSurface::new(800.0, 600.0).with_ratio(3.0);
    let config = SceneConfig {
        pixel_ratio: Some(1.0),
        ..Default::default()
    };
    let mut ctx = SceneContext::initialize(
        &surface,
        RecordingRenderer::new(),
        Box::new(SpinningCube::new()),
        &config,
    )
    .unwrap();
    assert_eq!(ctx.renderer().pixel_ratio(), 1.0);
    ctx.on_resize(&surface);
    assert_eq!(ctx.renderer().pixel_ratio(), 1.0);
}

#[test]
fn resize_reaches_camera_and_renderer_before_the_next_frame() {
    let mut surface = FixedSurface::new(800.0, 600.0);
    let mut ctx = bootstrap(&surface, Box::new(SpinningCube::new()));
    ctx.on_frame().unwrap();

    surface.resize(400.0, 300.0);
    ctx.on_resize(&surface);
    assert!(ctx.camera().is_projection_dirty());
    assert_eq!(ctx.renderer().size(), LogicalSize::new(400.0, 300.0));

    ctx.on_frame().unwrap();
    let frame = ctx.renderer().last_frame();
    assert!((frame.aspect - 400.0 / 300.0).abs() < 1e-6);
    assert_eq!(frame.viewport, LogicalSize::new(400.0, 300.0));
    assert!(!frame.projection_dirty);
    assert!(!ctx.camera().is_projection_dirty());
}

#[test]
fn empty_resize_is_ignored() {
    let mut surface = FixedSurface::new(800.0, 600.0);
    let mut ctx = bootstrap(&surface, Box::new(SpinningCube::new()));
    let resizes = ctx.renderer().resizes;

    surface.resize(0.0, 0.0);
    ctx.on_resize(&surface);
    assert_eq!(ctx.renderer().resizes, resizes);
    assert!((ctx.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn every_running_tick_renders_exactly_once() {
    let surface = FixedSurface::new(800.0, 600.0);
    let counter = FlowCounter::default();
    let mut ctx = bootstrap(&surface, counter.wrap(SpinningCube::new()));

    for _ in 0..5 {
        assert!(ctx.on_frame().unwrap());
    }
    assert_eq!(ctx.renderer().render_count(), 5);
    assert_eq!(counter.update_invocations(), 5);
    assert_eq!(counter.init_invocations(), 1);
}

#[test]
fn stop_halts_drawing_and_play_resumes_the_same_scene() {
    let surface = FixedSurface::new(800.0, 600.0);
    let counter = FlowCounter::default();
    let mut ctx = bootstrap(&surface, counter.wrap(SpinningCube::new()));
    ctx.on_frame().unwrap();
    ctx.on_frame().unwrap();

    ctx.stop();
    assert!(!ctx.is_playing());
    for _ in 0..3 {
        assert!(!ctx.on_frame().unwrap());
    }
    assert_eq!(ctx.renderer().render_count(), 2);
    assert_eq!(counter.update_invocations(), 2);

    let nodes = ctx.scene().len();
    let rotation = ctx.scene().nodes()[0].transform().rotation;
    assert!((rotation.x - 2.0 * SPIN_PER_FRAME).abs() < 1e-6);

    ctx.play();
    ctx.on_frame().unwrap();
    assert_eq!(ctx.renderer().render_count(), 3);
    assert_eq!(counter.init_invocations(), 1);
    assert_eq!(ctx.scene().len(), nodes);
    let rotation = ctx.scene().nodes()[0].transform().rotation;
    assert!((rotation.x - 3.0 * SPIN_PER_FRAME).abs() < 1e-6);
    assert!((rotation.y - 3.0 * SPIN_PER_FRAME).abs() < 1e-6);
    assert!((rotation.z - 3.0 * SPIN_PER_FRAME).abs() < 1e-6);
}

struct Row(usize);

impl SceneFlow for Row {
    fn on_init(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        let geometry = Arc::new(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = Arc::new(Material::basic());
        let mut group = Group::new("row");
        group.transform.set_position(0.0, 2.0, -3.0);
        for i in 0..self.0 {
            let mut mesh = Mesh::new(geometry.clone(), material.clone());
            mesh.transform.position.x = i as f32;
            group.add(mesh);
        }
        scene.add(group);
        Ok(())
    }
}

#[test]
fn group_members_are_drawn_with_the_group_transform() {
    let surface = FixedSurface::new(640.0, 480.0);
    let mut ctx = bootstrap(&surface, Box::new(Row(4)));
    ctx.on_frame().unwrap();

    let frame = ctx.renderer().last_frame();
    assert_eq!(frame.mesh_origins.len(), 4);
    for (i, origin) in frame.mesh_origins.iter().enumerate() {
        assert_eq!(*origin, Vector3::new(i as f32, 2.0, -3.0));
    }
    assert_eq!(frame.background, 0x8fbcd4);
}

#[test]
fn toy_train_has_seven_meshes_and_three_lights() {
    let surface = FixedSurface::new(800.0, 600.0);
    let counter = FlowCounter::default();
    let mut ctx = bootstrap(&surface, counter.wrap(ToyTrain::new()));
    ctx.on_frame().unwrap();
    ctx.on_frame().unwrap();

    let frame = ctx.renderer().last_frame();
    assert_eq!(frame.mesh_origins.len(), 7);
    assert_eq!(frame.light_count, 3);
    assert!(frame.mesh_origins.contains(&Vector3::new(1.5, -0.1, 0.0)));
    assert!(frame.mesh_origins.contains(&Vector3::new(-2.0, 0.9, 0.0)));
    // static scene: frames are identical
    assert_eq!(
        ctx.renderer().frames[0].mesh_origins,
        ctx.renderer().frames[1].mesh_origins
    );
}

#[test]
fn orbit_controls_move_the_camera_but_not_the_scene() {
    let surface = FixedSurface::new(800.0, 600.0);
    let mut ctx = bootstrap(&surface, Box::new(SpinningCube::new()));
    ctx.on_frame().unwrap();
    let distance = ctx.camera().position.distance(Point3::origin());
    let before = ctx.camera().position;

    // SAFETY: only used as an opaque id, never passed to the platform
    let device_id = unsafe { winit::event::DeviceId::dummy() };
    let press = WindowEvent::MouseInput {
        device_id,
        state: winit::event::ElementState::Pressed,
        button: winit::event::MouseButton::Left,
    };
    let at = |x: f64, y: f64| WindowEvent::CursorMoved {
        device_id,
        position: winit::dpi::PhysicalPosition::new(x, y),
    };
    assert!(ctx.handle_window_events(&press, 600.0));
    ctx.handle_window_events(&at(100.0, 100.0), 600.0);
    assert!(ctx.handle_window_events(&at(250.0, 160.0), 600.0));
    ctx.on_frame().unwrap();

    let after = ctx.camera().position;
    assert_ne!(before, after);
    assert!((after.distance(Point3::origin()) - distance).abs() < 1e-4);
    assert_eq!(ctx.renderer().last_frame().mesh_origins, vec![Vector3::new(0.0, 0.0, 0.0)]);
}

#[test]
fn controls_can_be_turned_off() {
    let surface = FixedSurface::new(800.0, 600.0);
    let config = SceneConfig {
        controls: false,
        ..Default::default()
    };
    let mut ctx = SceneContext::initialize(
        &surface,
        RecordingRenderer::new(),
        Box::new(SpinningCube::new()),
        &config,
    )
    .unwrap();
    assert!(ctx.controls_mut().is_none());
    ctx.on_frame().unwrap();
    assert_eq!(ctx.camera().position, Point3::new(-5.0, 5.0, 7.0));
}
