//! Surface materials and colors.

/// An sRGB color, usually written as a 24-bit hex literal such as `0x8FBCD4`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn to_hex(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Linear-light components, as expected by shaders writing to an sRGB target.
    pub fn to_linear(&self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    /// Clear colour for a render pass targeting an sRGB surface.
    pub fn to_wgpu(&self) -> wgpu::Color {
        let [r, g, b] = self.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// How a material reacts to light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Unlit: the surface always shows its own color.
    Basic,
    /// Diffuse lighting from the scene's ambient and directional lights.
    Standard,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub shading: Shading,
    /// Per-face normals instead of interpolated vertex normals.
    pub flat_shading: bool,
}

impl Material {
    /// A white material that ignores lights.
    pub fn basic() -> Self {
        Self {
            color: Color::WHITE,
            shading: Shading::Basic,
            flat_shading: false,
        }
    }

    pub fn standard(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Standard,
            flat_shading: false,
        }
    }

    pub fn with_flat_shading(mut self, flat_shading: bool) -> Self {
        self.flat_shading = flat_shading;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn is_lit(&self) -> bool {
        self.shading == Shading::Standard
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::basic()
    }
}
