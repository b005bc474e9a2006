//! Scene and window options.
//!
//! [`SceneConfig::default`] carries the constants the built-in scenes were
//! designed around; callers adjust fields before handing the config to
//! [`crate::flow::run`] or [`crate::bootstrap::SceneContext::initialize`].

use cgmath::{Point3, point3};

use crate::data_structures::material::Color;

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 35.0,
            near: 0.1,
            far: 100.0,
            position: point3(-5.0, 5.0, 7.0),
            target: point3(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub background: Color,
    pub camera: CameraConfig,
    /// Attach orbit controls to the camera.
    pub controls: bool,
    /// 4x multisampling.
    pub antialias: bool,
    /// Overrides the display's device pixel ratio when set.
    pub pixel_ratio: Option<f64>,
    pub title: String,
    /// Initial logical window size.
    pub window_size: (f64, f64),
    /// Id of the `<canvas>` element to render into on the web.
    pub canvas_id: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Color::from_hex(0x8fbcd4),
            camera: CameraConfig::default(),
            controls: true,
            antialias: true,
            pixel_ratio: None,
            title: "scene-bootstrap".to_string(),
            window_size: (800.0, 600.0),
            canvas_id: "scene-container".to_string(),
        }
    }
}

impl SceneConfig {
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}
