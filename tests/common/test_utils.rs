#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use scene_bootstrap::{
    LogicalSize,
    camera::PerspectiveCamera,
    cgmath::Vector3,
    data_structures::scene_graph::Scene,
    flow::SceneFlow,
    render::Renderer,
    surface::DisplaySurface,
    time::FrameTime,
};

/// A display surface with a size the test controls.
pub(crate) struct FixedSurface {
    pub size: LogicalSize<f64>,
    pub ratio: f64,
}

impl FixedSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: LogicalSize::new(width, height),
            ratio: 1.0,
        }
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = LogicalSize::new(width, height);
    }
}

impl DisplaySurface for FixedSurface {
    fn client_size(&self) -> LogicalSize<f64> {
        self.size
    }

    fn pixel_ratio(&self) -> f64 {
        self.ratio
    }
}

/// What a single `render` call saw.
#[derive(Clone, Debug)]
pub(crate) struct RecordedFrame {
    pub aspect: f32,
    pub projection_dirty: bool,
    pub viewport: LogicalSize<f64>,
    pub mesh_origins: Vec<Vector3<f32>>,
    pub light_count: usize,
    pub background: u32,
}

/// A renderer that draws nothing and remembers every call.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pixel_ratio: f64,
    size: LogicalSize<f64>,
    pub frames: Vec<RecordedFrame>,
    pub resizes: u32,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Default::default()
        }
    }

    pub fn render_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> &RecordedFrame {
        self.frames.last().expect("nothing was rendered yet")
    }
}

impl Renderer for RecordingRenderer {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, size: LogicalSize<f64>) {
        self.size = size;
        self.resizes += 1;
    }

    fn size(&self) -> LogicalSize<f64> {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        let items = scene.traverse();
        self.frames.push(RecordedFrame {
            aspect: camera.aspect(),
            projection_dirty: camera.is_projection_dirty(),
            viewport: self.size,
            mesh_origins: items
                .draws
                .iter()
                .map(|draw| Vector3::new(draw.world.w.x, draw.world.w.y, draw.world.w.z))
                .collect(),
            light_count: items.lights.len(),
            background: scene.background.to_hex(),
        });
        Ok(())
    }
}

/// Counts lifecycle calls of a wrapped flow.
#[derive(Clone, Default)]
pub(crate) struct FlowCounter {
    init_invocations: Rc<Cell<u32>>,
    update_invocations: Rc<Cell<u32>>,
}

impl FlowCounter {
    pub fn init_invocations(&self) -> u32 {
        self.init_invocations.get()
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations.get()
    }

    pub fn wrap(&self, flow: impl SceneFlow + 'static) -> Box<dyn SceneFlow> {
        Box::new(CountingFlow {
            inner: Box::new(flow),
            counter: self.clone(),
        })
    }
}

struct CountingFlow {
    inner: Box<dyn SceneFlow>,
    counter: FlowCounter,
}

impl SceneFlow for CountingFlow {
    fn on_init(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        self.counter.init_invocations.set(self.counter.init_invocations() + 1);
        self.inner.on_init(scene)
    }

    fn on_update(&mut self, scene: &mut Scene, time: FrameTime) {
        self.counter.update_invocations.set(self.counter.update_invocations() + 1);
        self.inner.on_update(scene, time);
    }
}
