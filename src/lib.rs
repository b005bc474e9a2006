//! scene-bootstrap
//!
//! A minimal 3D scene bootstrapper on top of wgpu and winit. It assembles a
//! camera, a few primitive meshes and lights, attaches orbit controls and
//! drives a render loop that redraws every display frame and follows window
//! resizes. Runs natively and on the web (WebGL2).
//!
//! High-level modules
//! - `config`: scene constants and window/renderer options
//! - `surface`: the display surface abstraction (window size, pixel ratio)
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `data_structures`: geometry, materials, lights, transforms and the scene graph
//! - `render`: the `Renderer` capability and per-frame draw lists
//! - `context`: the wgpu-backed renderer
//! - `pipelines`: the scene render pipeline and light uniform resources
//! - `animation_loop`: the cancellable per-frame task
//! - `bootstrap`: scene assembly, play/stop, frame and resize handling
//! - `flow`: the `SceneFlow` trait and the winit application
//! - `flows`: built-in scenes (spinning cube, toy train)
//!

pub mod animation_loop;
pub mod bootstrap;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod flows;
pub mod pipelines;
pub mod render;
pub mod surface;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::dpi::{LogicalSize, PhysicalSize};
pub use winit::event::WindowEvent;
