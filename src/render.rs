//! Render composition.
//!
//! A frame is described by [`FrameItems`]: the scene graph flattened into
//! world-space meshes and lights by [`Scene::traverse`]. Anything that can
//! turn those into pixels implements [`Renderer`]; the wgpu implementation
//! lives in [`crate::context`].
//!
//! # Key types
//!
//! - [`Renderer`] is the capability the render loop and resize reactor depend on
//! - [`DrawItem`] is one mesh with its accumulated world transform
//! - [`LightItem`] is one light with its world position

use cgmath::{Matrix4, Vector3};
use winit::dpi::{LogicalSize, PhysicalSize};

use crate::{
    camera::PerspectiveCamera,
    data_structures::{
        light::{Light, LightKind},
        scene_graph::{Mesh, Scene},
    },
};

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Draws a scene from a camera into some output surface.
///
/// The size is logical; the output buffer holds `size * pixel_ratio` pixels.
pub trait Renderer {
    fn set_pixel_ratio(&mut self, ratio: f64);

    fn pixel_ratio(&self) -> f64;

    /// Resize the output buffer and the viewport.
    fn set_size(&mut self, size: LogicalSize<f64>);

    fn size(&self) -> LogicalSize<f64>;

    fn physical_size(&self) -> PhysicalSize<u32> {
        self.size().to_physical(self.pixel_ratio())
    }

    /// Draw one frame. The camera's projection is expected to be up to date.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
}

pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub world: Matrix4<f32>,
}

pub struct LightItem<'a> {
    pub light: &'a Light,
    pub position: Vector3<f32>,
}

#[derive(Default)]
pub struct FrameItems<'a> {
    pub draws: Vec<DrawItem<'a>>,
    pub lights: Vec<LightItem<'a>>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Unit vector toward the light, w unused.
    direction: [f32; 4],
    /// Linear color times intensity, w unused.
    color: [f32; 4],
}

/// All scene lights packed for the fragment shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    count: u32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: [u32; 3],
}

impl LightUniform {
    pub fn new() -> Self {
        Self {
            ambient: [0.0; 4],
            directional: [DirectionalLightRaw::default(); MAX_DIRECTIONAL_LIGHTS],
            count: 0,
            _padding: [0; 3],
        }
    }

    /// Sum ambient lights and pack directional ones in scene order.
    pub fn from_items(lights: &[LightItem<'_>]) -> Self {
        let mut uniform = Self::new();
        let mut dropped = 0;
        for item in lights {
            let [r, g, b] = item.light.radiance();
            match item.light.kind {
                LightKind::Ambient => {
                    uniform.ambient[0] += r;
                    uniform.ambient[1] += g;
                    uniform.ambient[2] += b;
                }
                LightKind::Directional { .. } => {
                    let Some(direction) = item.light.direction_from(item.position) else {
                        log::debug!("directional light sits on its target, skipping");
                        continue;
                    };
                    let slot = uniform.count as usize;
                    if slot >= MAX_DIRECTIONAL_LIGHTS {
                        dropped += 1;
                        continue;
                    }
                    uniform.directional[slot] = DirectionalLightRaw {
                        direction: direction.extend(0.0).into(),
                        color: [r, g, b, 0.0],
                    };
                    uniform.count += 1;
                }
            }
        }
        if dropped > 0 {
            log::warn!(
                "{} directional light(s) exceed the limit of {} and are ignored",
                dropped,
                MAX_DIRECTIONAL_LIGHTS
            );
        }
        uniform
    }

    pub fn directional_count(&self) -> u32 {
        self.count
    }

    pub fn ambient(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::material::Color;

    #[test]
    fn light_uniform_matches_the_shader_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 160);
    }

    #[test]
    fn ambient_lights_add_up() {
        let a = Light::ambient(Color::WHITE, 0.25);
        let b = Light::ambient(Color::WHITE, 0.5);
        let items = [
            LightItem { light: &a, position: Vector3::new(0.0, 0.0, 0.0) },
            LightItem { light: &b, position: Vector3::new(0.0, 0.0, 0.0) },
        ];
        let uniform = LightUniform::from_items(&items);
        assert!(uniform.ambient().iter().all(|c| (c - 0.75).abs() < 1e-6));
        assert_eq!(uniform.directional_count(), 0);
    }

    #[test]
    fn extra_directional_lights_are_dropped() {
        let light = Light::directional(Color::WHITE, 1.0);
        let items: Vec<_> = (0..6)
            .map(|i| LightItem {
                light: &light,
                position: Vector3::new(i as f32 + 1.0, 1.0, 0.0),
            })
            .collect();
        let uniform = LightUniform::from_items(&items);
        assert_eq!(uniform.directional_count(), MAX_DIRECTIONAL_LIGHTS as u32);
    }
}
