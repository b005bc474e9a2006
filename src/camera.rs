//! Perspective camera, orbit controls and the camera uniform.
//!
//! The camera keeps its projection matrix cached. Anything that changes the
//! frustum (aspect, field of view, clip planes) only marks it dirty; the
//! matrix is rebuilt by [`PerspectiveCamera::update_projection_matrix`], which
//! the render loop calls before every draw.

use std::f32::consts::{PI, TAU};

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

/// cgmath builds OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    fovy: Deg<f32>,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Matrix4<f32>,
    projection_dirty: bool,
}

impl PerspectiveCamera {
    /// A camera at the origin looking down -Z, with an up-to-date projection.
    pub fn new<F: Into<Deg<f32>>>(fovy: F, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            fovy: fovy.into(),
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
            projection_dirty: true,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection_dirty = true;
    }

    pub fn set_fovy<F: Into<Deg<f32>>>(&mut self, fovy: F) {
        self.fovy = fovy.into();
        self.projection_dirty = true;
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    /// Match the aspect ratio to a surface of the given size.
    ///
    /// Zero-sized surfaces (minimized windows) are ignored.
    pub fn resize(&mut self, size: LogicalSize<f64>) {
        if size.width > 0.0 && size.height > 0.0 {
            self.set_aspect((size.width / size.height) as f32);
        }
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    /// Rebuild the projection matrix if any frustum parameter changed.
    pub fn update_projection_matrix(&mut self) {
        if self.projection_dirty {
            self.projection =
                OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.near, self.far);
            self.projection_dirty = false;
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}

/// Revolves a camera around a target point from mouse input.
///
/// Left-drag orbits, the wheel dollies in and out. The scene itself is never
/// touched; only the camera's position changes.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    rotating: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

const POLAR_EPSILON: f32 = 1e-6;

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            rotating: false,
            last_cursor: None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Orbit horizontally by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    /// Orbit vertically by `angle` radians.
    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move toward the target; `factor` < 1 shortens the distance.
    pub fn dolly(&mut self, factor: f32) {
        self.scale *= factor;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// A drag of `dx`, `dy` pixels over an element `height` pixels tall.
    pub fn drag(&mut self, dx: f64, dy: f64, height: f64) {
        if height <= 0.0 {
            return;
        }
        self.rotate_left(TAU * dx as f32 / height as f32 * self.rotate_speed);
        self.rotate_up(TAU * dy as f32 / height as f32 * self.rotate_speed);
    }

    /// `notches` > 0 scrolls away from the user and zooms in.
    pub fn scroll(&mut self, notches: f32) {
        if notches > 0.0 {
            self.dolly(self.zoom_scale());
        } else if notches < 0.0 {
            self.dolly(1.0 / self.zoom_scale());
        }
    }

    /// Feed a window event; `height` is the window's inner height in physical
    /// pixels. Returns whether the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent, height: f64) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let consumed = match (self.rotating, self.last_cursor) {
                    (true, Some(last)) => {
                        self.drag(position.x - last.x, position.y - last.y, height);
                        true
                    }
                    _ => false,
                };
                self.last_cursor = Some(*position);
                consumed
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.scroll(notches);
                true
            }
            _ => false,
        }
    }

    /// Apply the accumulated input to `camera`. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        let moved = self.delta_theta != 0.0 || self.delta_phi != 0.0 || self.scale != 1.0;

        let (theta, phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };
        let theta = theta + self.delta_theta;
        let phi = (phi + self.delta_phi).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        moved
    }
}

/// The camera data bound to the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            eye: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &PerspectiveCamera) {
        self.view_proj = camera.view_projection_matrix().into();
        self.eye = camera.position.to_homogeneous().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera: the uniform buffer and its bind group (group 0).
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &PerspectiveCamera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
