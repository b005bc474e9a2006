//! The wgpu implementation of [`Renderer`].
//!
//! [`WgpuRenderer`] owns the device, the output target and every GPU
//! resource a frame needs: camera and light uniforms, the scene pipeline,
//! depth and multisample attachments, per-geometry vertex/index buffers and a
//! growing instance buffer holding one [`InstanceRaw`] per drawn mesh.

use std::{collections::HashMap, iter, sync::Arc};

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    window::Window,
};

use crate::{
    camera::{CameraResources, PerspectiveCamera},
    config::SceneConfig,
    data_structures::{geometry::Geometry, instance::InstanceRaw, scene_graph::Scene, texture},
    pipelines::{basic::mk_basic_pipeline, light::LightResources},
    render::{LightUniform, Renderer},
};

/// Vertex and index buffers uploaded once per [`Geometry`].
#[derive(Debug)]
struct GeometryBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl GeometryBuffers {
    fn new(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Geometry Vertex Buffer"),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Geometry Index Buffer"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: geometry.indices().len() as u32,
        }
    }
}

#[derive(Debug)]
enum Target {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    #[cfg(feature = "integration-tests")]
    Offscreen { texture: wgpu::Texture },
}

#[derive(Debug)]
pub struct WgpuRenderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    target: Target,
    format: wgpu::TextureFormat,
    sample_count: u32,
    pixel_ratio: f64,
    size: LogicalSize<f64>,
    depth_texture: texture::Texture,
    msaa_texture: Option<texture::Texture>,
    camera: CameraResources,
    light: LightResources,
    pipeline: wgpu::RenderPipeline,
    geometries: HashMap<u64, GeometryBuffers>,
    instance_buffer: Option<wgpu::Buffer>,
    instance_capacity: usize,
    frames: u64,
}

impl WgpuRenderer {
    /// Create a renderer presenting to `window`.
    ///
    /// The output buffer starts at the window's current size and scale factor
    /// unless `config.pixel_ratio` overrides the latter.
    pub async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let pixel_ratio = config.pixel_ratio.unwrap_or_else(|| window.scale_factor());
        let size: LogicalSize<f64> = window.inner_size().to_logical(window.scale_factor());
        let physical: PhysicalSize<u32> = size.to_physical(pixel_ratio);

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create the wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colour; an sRGB surface does the encoding.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical.width.max(1),
            height: physical.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if physical.width > 0 && physical.height > 0 {
            surface.configure(&device, &surface_config);
        }

        let sample_count = supported_sample_count(&adapter, format, config.sample_count());
        let target = Target::Surface {
            surface,
            config: surface_config,
        };
        Ok(Self::with_target(
            device,
            queue,
            target,
            format,
            sample_count,
            pixel_ratio,
            size,
        ))
    }

    /// Create a renderer drawing into an offscreen texture that can be read
    /// back with [`WgpuRenderer::read_pixels`].
    #[cfg(feature = "integration-tests")]
    pub async fn headless(size: LogicalSize<f64>, config: &SceneConfig) -> anyhow::Result<Self> {
        let pixel_ratio = config.pixel_ratio.unwrap_or(1.0);
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let sample_count = supported_sample_count(&adapter, format, config.sample_count());
        let texture = mk_offscreen_texture(&device, size.to_physical(pixel_ratio), format);
        Ok(Self::with_target(
            device,
            queue,
            Target::Offscreen { texture },
            format,
            sample_count,
            pixel_ratio,
            size,
        ))
    }

    fn with_target(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: Target,
        format: wgpu::TextureFormat,
        sample_count: u32,
        pixel_ratio: f64,
        size: LogicalSize<f64>,
    ) -> Self {
        let physical: PhysicalSize<u32> = size.to_physical(pixel_ratio);
        let camera = CameraResources::new(&device);
        let light = LightResources::new(&device);
        let pipeline = mk_basic_pipeline(
            &device,
            format,
            sample_count,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let (depth_texture, msaa_texture) =
            mk_attachments(&device, physical, format, sample_count);
        log::info!(
            "renderer ready: {}x{} physical pixels, {} sample(s), {:?}",
            physical.width,
            physical.height,
            sample_count,
            format
        );

        Self {
            device,
            queue,
            target,
            format,
            sample_count,
            pixel_ratio,
            size,
            depth_texture,
            msaa_texture,
            camera,
            light,
            pipeline,
            geometries: HashMap::new(),
            instance_buffer: None,
            instance_capacity: 0,
            frames: 0,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Frames submitted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn reconfigure(&mut self) {
        let physical = self.physical_size();
        if physical.width == 0 || physical.height == 0 {
            return;
        }
        match &mut self.target {
            Target::Surface { surface, config } => {
                config.width = physical.width;
                config.height = physical.height;
                surface.configure(&self.device, config);
            }
            #[cfg(feature = "integration-tests")]
            Target::Offscreen { texture } => {
                *texture = mk_offscreen_texture(&self.device, physical, self.format);
            }
        }
        (self.depth_texture, self.msaa_texture) =
            mk_attachments(&self.device, physical, self.format, self.sample_count);
    }

    fn ensure_instance_capacity(&mut self, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_buffer.is_some() {
            return;
        }
        let new_cap = required_instances.next_power_of_two().max(16);
        self.instance_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (new_cap * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }

    /// Acquire the view to draw into. `Ok(None)` means skip this frame.
    fn acquire(&self) -> anyhow::Result<Option<(Option<wgpu::SurfaceTexture>, wgpu::TextureView)>> {
        match &self.target {
            Target::Surface { surface, config } => {
                let output = match surface.get_current_texture() {
                    Ok(output) => output,
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::warn!("surface lost or outdated, reconfiguring");
                        surface.configure(&self.device, config);
                        return Ok(None);
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("timed out waiting for the next surface texture");
                        return Ok(None);
                    }
                    Err(e) => return Err(e).context("failed to acquire the next surface texture"),
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Some((Some(output), view)))
            }
            #[cfg(feature = "integration-tests")]
            Target::Offscreen { texture } => Ok(Some((
                None,
                texture.create_view(&wgpu::TextureViewDescriptor::default()),
            ))),
        }
    }

    /// Copy the offscreen target of a headless renderer into an image.
    #[cfg(feature = "integration-tests")]
    pub async fn read_pixels(&self) -> anyhow::Result<image::RgbaImage> {
        let Target::Offscreen { texture } = &self.target else {
            anyhow::bail!("only headless renderers can be read back");
        };
        let (width, height) = (texture.width(), texture.height());
        let unpadded_bytes_per_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            texture.size(),
        );
        self.queue.submit(iter::once(encoder.finish()));

        // NOTE: the mapping has to be requested before polling, otherwise the
        // receiver never resolves.
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(std::time::Duration::from_secs(3)),
            })
            .context("failed to wait for the readback copy")?;
        rx.receive()
            .await
            .context("readback channel closed")?
            .context("failed to map the readback buffer")?;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in data.chunks(bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .context("readback size does not match the target")
    }
}

impl Renderer for WgpuRenderer {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio > 0.0 && ratio != self.pixel_ratio {
            self.pixel_ratio = ratio;
            self.reconfigure();
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, size: LogicalSize<f64>) {
        if size.width <= 0.0 || size.height <= 0.0 {
            log::debug!("ignoring resize to an empty surface");
            return;
        }
        self.size = size;
        self.reconfigure();
    }

    fn size(&self) -> LogicalSize<f64> {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        let physical = self.physical_size();
        if physical.width == 0 || physical.height == 0 {
            return Ok(());
        }
        let Some((output, view)) = self.acquire()? else {
            return Ok(());
        };

        let items = scene.traverse();
        self.camera.write(&self.queue, camera);
        self.light.write(&self.queue, LightUniform::from_items(&items.lights));

        for draw in &items.draws {
            let geometry = &draw.mesh.geometry;
            if !self.geometries.contains_key(&geometry.id()) {
                log::debug!("uploading geometry {} ({:?})", geometry.id(), geometry.shape());
                self.geometries
                    .insert(geometry.id(), GeometryBuffers::new(&self.device, geometry));
            }
        }
        let instances: Vec<InstanceRaw> = items
            .draws
            .iter()
            .map(|draw| InstanceRaw::new(&draw.world, &draw.mesh.material))
            .collect();
        self.ensure_instance_capacity(instances.len());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let (attachment, resolve_target) = match &self.msaa_texture {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let Some(instance_buffer) = self.instance_buffer.as_ref().filter(|_| !instances.is_empty()) {
                self.queue
                    .write_buffer(instance_buffer, 0, bytemuck::cast_slice(&instances));
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &self.light.bind_group, &[]);
                render_pass.set_vertex_buffer(1, instance_buffer.slice(..));
                for (i, draw) in items.draws.iter().enumerate() {
                    let Some(buffers) = self.geometries.get(&draw.mesh.geometry.id()) else {
                        continue;
                    };
                    let i = i as u32;
                    render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                    render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..buffers.index_count, 0, i..i + 1);
                }
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        if let Some(output) = output {
            output.present();
        }
        self.frames += 1;
        Ok(())
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create the wgpu device")
}

/// Fall back to single sampling when the adapter cannot multisample `format`.
fn supported_sample_count(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, requested: u32) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let flags = adapter.get_texture_format_features(format).flags;
    if flags.sample_count_supported(requested) {
        requested
    } else {
        log::warn!("{}x MSAA is not supported for {:?}, rendering without it", requested, format);
        1
    }
}

fn mk_attachments(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> (texture::Texture, Option<texture::Texture>) {
    let size = [size.width, size.height];
    let depth = texture::Texture::create_depth_texture(device, size, sample_count, "depth_texture");
    let msaa = (sample_count > 1)
        .then(|| texture::Texture::create_msaa_texture(device, size, sample_count, format));
    (depth, msaa)
}

#[cfg(feature = "integration-tests")]
fn mk_offscreen_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
