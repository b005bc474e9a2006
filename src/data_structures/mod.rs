//! Engine data structures: transforms, geometry, materials, lights and the scene graph.
//!
//! - `instance` holds node transforms and the per-draw GPU record
//! - `geometry` generates box and cylinder vertex data
//! - `material` contains colors and surface materials
//! - `light` contains ambient and directional light sources
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains the render attachments (depth, multisample color)

pub mod geometry;
pub mod instance;
pub mod light;
pub mod material;
pub mod scene_graph;
pub mod texture;
