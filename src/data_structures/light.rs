//! Light sources.
//!
//! Lights only affect [`Shading::Standard`](crate::data_structures::material::Shading)
//! materials. A directional light shines from its node's world position toward
//! its target; only the direction matters, not the distance.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use crate::data_structures::material::Color;

#[derive(Clone, Debug, PartialEq)]
pub enum LightKind {
    /// Uniform light reaching every surface from every direction.
    Ambient,
    /// Parallel rays, like sunlight.
    Directional { target: Point3<f32> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    /// A directional light aimed at the origin.
    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional {
                target: Point3::new(0.0, 0.0, 0.0),
            },
            color,
            intensity,
        }
    }

    /// Linear color scaled by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        let [r, g, b] = self.color.to_linear();
        [r * self.intensity, g * self.intensity, b * self.intensity]
    }

    /// Unit vector pointing from the lit surface toward the light, or `None`
    /// for ambient lights and lights sitting on their own target.
    pub fn direction_from(&self, world_position: Vector3<f32>) -> Option<Vector3<f32>> {
        match &self.kind {
            LightKind::Ambient => None,
            LightKind::Directional { target } => {
                let towards_light = world_position - target.to_vec();
                if towards_light.magnitude2() == 0.0 {
                    None
                } else {
                    Some(towards_light.normalize())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_light_points_back_at_its_position() {
        let light = Light::directional(Color::from_hex(0xffffff), 1.0);
        let dir = light.direction_from(Vector3::new(10.0, 10.0, 10.0)).unwrap();
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        assert!((dir - expected).magnitude() < 1e-6);
    }

    #[test]
    fn ambient_light_has_no_direction() {
        let light = Light::ambient(Color::from_hex(0xffffff), 1.0);
        assert!(light.direction_from(Vector3::new(1.0, 0.0, 0.0)).is_none());
        assert!(light.radiance().iter().all(|c| (c - 1.0).abs() < 1e-6));
    }
}
