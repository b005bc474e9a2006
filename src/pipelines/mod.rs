//! Render pipelines and their uniform resources.
//!
//! - `basic`: the single lit/unlit mesh pipeline and the shared pipeline builder
//! - `light`: the light uniform buffer and its bind group

pub mod basic;
pub mod light;
