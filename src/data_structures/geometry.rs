//! Primitive geometry generated on the CPU.
//!
//! Shapes are centered on the origin. Cylinders stand along +Y and wind their
//! angle from +Z toward +X. Every triangle is counter-clockwise when seen from
//! outside the shape, matching the back-face culling of the render pipeline.

use std::{
    f32::consts::TAU,
    sync::atomic::{AtomicU64, Ordering},
};

use cgmath::{InnerSpace, Matrix3, Rad, Vector3};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Radial segments used when a cylinder does not specify any.
pub const DEFAULT_RADIAL_SEGMENTS: u32 = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// The primitive a geometry was built from, kept for logging and inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
}

/// Indexed triangle list plus the unique id used to cache its GPU buffers.
#[derive(Debug)]
pub struct Geometry {
    id: u64,
    shape: Shape,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Geometry {
    fn from_parts(shape: Shape, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            vertices,
            indices,
        }
    }

    /// Axis-aligned box with four vertices per face so every face keeps its
    /// own normal.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u, v) with u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let n = Vector3::from(normal);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = n + u * su + v * sv;
                let position = Vector3::new(corner.x * half.x, corner.y * half.y, corner.z * half.z);
                vertices.push(Vertex {
                    position: position.into(),
                    normal,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_parts(
            Shape::Box {
                width,
                height,
                depth,
            },
            vertices,
            indices,
        )
    }

    /// Capped cylinder (or cone frustum) with the default segment count.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Self {
        Self::cylinder_with_segments(radius_top, radius_bottom, height, DEFAULT_RADIAL_SEGMENTS)
    }

    pub fn cylinder_with_segments(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    ) -> Self {
        let segments = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // side: a top and a bottom ring, with a duplicated seam column
        for (y, radius) in [(half_height, radius_top), (-half_height, radius_bottom)] {
            for i in 0..=segments {
                let theta = i as f32 / segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex {
                    position: [radius * sin, y, radius * cos],
                    normal: Vector3::new(sin, slope, cos).normalize().into(),
                });
            }
        }
        let row = segments + 1;
        for i in 0..segments {
            let a = i;
            let b = row + i;
            let c = row + i + 1;
            let d = i + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        // caps: a center vertex fanned out to a ring with the cap's own normal
        for (top, y, radius) in [(true, half_height, radius_top), (false, -half_height, radius_bottom)] {
            if radius <= 0.0 {
                continue;
            }
            let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
            let center = vertices.len() as u32;
            vertices.push(Vertex {
                position: [0.0, y, 0.0],
                normal,
            });
            for i in 0..=segments {
                let theta = i as f32 / segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex {
                    position: [radius * sin, y, radius * cos],
                    normal,
                });
            }
            for i in 0..segments {
                let current = center + 1 + i;
                let next = current + 1;
                if top {
                    indices.extend_from_slice(&[center, current, next]);
                } else {
                    indices.extend_from_slice(&[center, next, current]);
                }
            }
        }

        Self::from_parts(
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments: segments,
            },
            vertices,
            indices,
        )
    }

    /// Bakes a rotation about the X axis into the vertex data.
    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        let rotation = Matrix3::from_angle_x(Rad(angle));
        for vertex in &mut self.vertices {
            vertex.position = (rotation * Vector3::from(vertex.position)).into();
            vertex.normal = (rotation * Vector3::from(vertex.normal)).into();
        }
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
