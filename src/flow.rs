//! Flow control and application event loop.
//!
//! A "flow" is a scene description: it populates the [`Scene`] once and may
//! animate it every frame. [`run`] opens a window, creates the wgpu renderer
//! and drives a [`SceneContext`] from winit events.
//!
//! # Lifecycle
//!
//! 1. `resumed`: create the window and, asynchronously, the renderer
//! 2. once the renderer exists: [`SceneContext::initialize`] calls
//!    [`SceneFlow::on_init`] and starts the render loop
//! 3. `RedrawRequested`: one render-loop tick, then another redraw is
//!    requested while the loop is playing
//! 4. `Resized` / `ScaleFactorChanged`: [`SceneContext::on_resize`]
//! 5. `Space` toggles play/stop, `CloseRequested` exits

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    bootstrap::SceneContext, config::SceneConfig, context::WgpuRenderer,
    data_structures::scene_graph::Scene, time::FrameTime,
};

/// A scene that can be bootstrapped and animated.
///
/// `on_init` runs once, before the first frame. `on_update` runs once per
/// frame while the render loop is playing, right before the frame is drawn.
pub trait SceneFlow {
    /// Add meshes, groups and lights to the scene.
    fn on_init(&mut self, scene: &mut Scene) -> anyhow::Result<()>;

    /// Advance the animation by one frame. Static scenes keep the default.
    fn on_update(&mut self, _scene: &mut Scene, _time: FrameTime) {}
}

pub(crate) enum FlowEvent {
    /// Sent by the async renderer setup on the web.
    #[allow(dead_code)]
    RendererReady(anyhow::Result<WgpuRenderer>),
}

impl std::fmt::Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RendererReady(Ok(_)) => f.write_str("RendererReady(Ok)"),
            Self::RendererReady(Err(e)) => write!(f, "RendererReady(Err({}))", e),
        }
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<FlowEvent>,
    config: SceneConfig,
    window: Option<Arc<Window>>,
    context: Option<SceneContext<WgpuRenderer>>,
    // taken once the renderer is ready
    flow: Option<Box<dyn SceneFlow>>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        config: SceneConfig,
        flow: Box<dyn SceneFlow>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            config,
            window: None,
            context: None,
            flow: Some(flow),
        })
    }

    fn on_renderer(&mut self, event_loop: &ActiveEventLoop, renderer: anyhow::Result<WgpuRenderer>) {
        let (Some(window), Some(flow)) = (self.window.clone(), self.flow.take()) else {
            return;
        };
        let context = renderer
            .and_then(|renderer| SceneContext::initialize(window.as_ref(), renderer, flow, &self.config));
        match context {
            Ok(mut context) => {
                // the canvas may have been laid out while the renderer was pending
                context.on_resize(window.as_ref());
                self.context = Some(context);
                window.request_redraw();
            }
            Err(e) => {
                log::error!("Unable to bootstrap the scene: {:#}", e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let (width, height) = self.config.window_size;
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(width, height));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document
                .get_element_by_id(&self.config.canvas_id)
                .unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let config = self.config.clone();
        let init_future = async move { WgpuRenderer::new(window, &config).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let renderer = self.async_runtime.block_on(init_future);
            self.on_renderer(event_loop, renderer);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = init_future.await;
                if proxy.send_event(FlowEvent::RendererReady(renderer)).is_err() {
                    log::error!("event loop closed before the renderer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::RendererReady(renderer) => self.on_renderer(event_loop, renderer),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(window), Some(context)) = (self.window.as_ref(), self.context.as_mut()) else {
            return;
        };

        context.handle_window_events(&event, window.inner_size().height as f64);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                context.on_resize(window.as_ref());
                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Space),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if context.is_playing() {
                    log::info!("render loop stopped");
                    context.stop();
                } else {
                    log::info!("render loop resumed");
                    context.play();
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => match context.on_frame() {
                Ok(_) => {
                    if context.is_playing() {
                        window.request_redraw();
                    }
                }
                Err(e) => {
                    log::error!("Unable to render {:#}", e);
                    event_loop.exit();
                }
            },
            _ => {}
        }
    }
}

/// Open a window and run `flow` until the window is closed.
pub fn run(config: SceneConfig, flow: Box<dyn SceneFlow>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, flow)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
