//! Scene assembly and the per-frame contract.
//!
//! [`SceneContext::initialize`] builds the scene in a fixed order: background,
//! camera sized to the display surface, optional orbit controls, the flow's
//! meshes and lights, then the renderer's pixel ratio and size. It finishes by
//! attaching the render loop, so a freshly initialized context is playing.
//!
//! Every running frame performs, in order:
//! 1. orbit-control motion and any pending projection update
//! 2. [`SceneFlow::on_update`]
//! 3. exactly one [`Renderer::render`]

use cgmath::Deg;
use winit::event::WindowEvent;

use crate::{
    animation_loop::AnimationLoop,
    camera::{OrbitControls, PerspectiveCamera},
    config::SceneConfig,
    data_structures::scene_graph::Scene,
    flow::SceneFlow,
    render::Renderer,
    surface::DisplaySurface,
    time::FrameTime,
};

/// Everything the render loop mutates.
pub struct SceneState<R> {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: Option<OrbitControls>,
    pub renderer: R,
    flow: Box<dyn SceneFlow>,
    pixel_ratio_override: Option<f64>,
}

pub struct SceneContext<R> {
    state: SceneState<R>,
    animation: AnimationLoop<SceneState<R>>,
}

impl<R: Renderer + 'static> SceneContext<R> {
    pub fn initialize(
        surface: &dyn DisplaySurface,
        mut renderer: R,
        mut flow: Box<dyn SceneFlow>,
        config: &SceneConfig,
    ) -> anyhow::Result<Self> {
        let scene_size = surface.client_size();
        let aspect = surface.aspect().unwrap_or_else(|| {
            log::warn!("display surface is empty ({:?}), assuming a square viewport", scene_size);
            1.0
        });

        let mut scene = Scene::new(config.background);

        let mut camera = PerspectiveCamera::new(
            Deg(config.camera.fov),
            aspect as f32,
            config.camera.near,
            config.camera.far,
        );
        camera.position = config.camera.position;
        camera.look_at(config.camera.target);

        let controls = config.controls.then(|| OrbitControls::new(config.camera.target));

        flow.on_init(&mut scene)?;
        log::info!("scene ready with {} top-level node(s)", scene.len());

        renderer.set_pixel_ratio(config.pixel_ratio.unwrap_or_else(|| surface.pixel_ratio()));
        renderer.set_size(scene_size);

        let mut animation = AnimationLoop::new();
        animation.set_animation_loop(Some(Box::new(render_frame::<R>)));

        Ok(Self {
            state: SceneState {
                scene,
                camera,
                controls,
                renderer,
                flow,
                pixel_ratio_override: config.pixel_ratio,
            },
            animation,
        })
    }

    /// Resume the render loop. Scene state is left as it was at `stop`.
    pub fn play(&mut self) {
        self.animation.start();
    }

    pub fn stop(&mut self) {
        self.animation.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.animation.is_running()
    }

    /// Call once per display frame. Returns whether a frame was drawn.
    pub fn on_frame(&mut self) -> anyhow::Result<bool> {
        self.animation.tick(&mut self.state)
    }

    /// Match camera and renderer to the surface's current size.
    pub fn on_resize(&mut self, surface: &dyn DisplaySurface) {
        let size = surface.client_size();
        if size.width <= 0.0 || size.height <= 0.0 {
            log::debug!("ignoring resize to {:?}", size);
            return;
        }
        let state = &mut self.state;
        state.camera.resize(size);
        state
            .renderer
            .set_pixel_ratio(state.pixel_ratio_override.unwrap_or_else(|| surface.pixel_ratio()));
        state.renderer.set_size(size);
    }

    /// Forward input to the orbit controls. `height` is the window's inner
    /// height in the same pixels as the event's cursor positions.
    pub fn handle_window_events(&mut self, event: &WindowEvent, height: f64) -> bool {
        match self.state.controls.as_mut() {
            Some(controls) => controls.handle_window_events(event, height),
            None => false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.state.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.state.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.state.camera
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.state.controls.as_mut()
    }

    pub fn renderer(&self) -> &R {
        &self.state.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.state.renderer
    }
}

fn render_frame<R: Renderer>(state: &mut SceneState<R>, time: FrameTime) -> anyhow::Result<()> {
    if let Some(controls) = state.controls.as_mut() {
        controls.update(&mut state.camera);
    }
    state.camera.update_projection_matrix();
    state.flow.on_update(&mut state.scene, time);
    state.renderer.render(&state.scene, &state.camera)
}
