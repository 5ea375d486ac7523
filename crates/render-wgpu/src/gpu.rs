use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use horizon_assets::{AssetId, ResourceSet, TextureData};
use horizon_common::{RenderConfig, TargetSurface};
use horizon_render::{
    Frame, Mesh, ObjectId, PointCloud, RenderError, RenderPipeline, Renderable, SceneObject, Side,
};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.005,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
    viewport: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PointInstance {
    position: [f32; 3],
    size: f32,
    color: [f32; 4],
}

/// Convert one sRGB-encoded channel to linear light.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_color(c: [f32; 3]) -> [f32; 4] {
    [srgb_to_linear(c[0]), srgb_to_linear(c[1]), srgb_to_linear(c[2]), 1.0]
}

/// Bounding-sphere test against the six clip planes of `view_proj`.
pub fn sphere_in_frustum(view_proj: Mat4, center: Vec3, radius: f32) -> bool {
    let rows = [
        view_proj.row(0),
        view_proj.row(1),
        view_proj.row(2),
        view_proj.row(3),
    ];
    let planes = [
        rows[3] + rows[0],
        rows[3] - rows[0],
        rows[3] + rows[1],
        rows[3] - rows[1],
        rows[2],
        rows[3] - rows[2],
    ];
    let point = center.extend(1.0);
    planes.iter().all(|plane| {
        let normal = plane.truncate().length();
        normal == 0.0 || plane.dot(point) / normal >= -radius
    })
}

/// Bounding radius of an object in world units.
fn bounding_radius(object: &SceneObject) -> f32 {
    let local = match &object.body {
        Renderable::Mesh(mesh) => mesh.geometry.radius,
        Renderable::Points(cloud) => cloud
            .positions
            .iter()
            .map(|p| p.length())
            .fold(0.0, f32::max),
    };
    local * object.transform.scale.max_element()
}

enum GpuBody {
    Mesh {
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
        edges: wgpu::Buffer,
        edge_count: u32,
        /// Texture currently bound, if the material's texture was ready.
        bound_texture: Option<AssetId>,
    },
    Points {
        instances: wgpu::Buffer,
        count: u32,
    },
}

struct GpuObject {
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    body: GpuBody,
}

/// An acquired surface texture waiting for overlays and presentation.
struct PendingFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// What an overlay painter (e.g. egui) draws into before presentation.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
    pub size_in_pixels: [u32; 2],
}

/// wgpu render pipeline compositing the three scene layers onto a surface.
///
/// Meshes and point clouds are uploaded on first sight and cached by object
/// id; transforms, colors and uniforms are refreshed every frame.
pub struct WgpuPipeline {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    caps: wgpu::SurfaceCapabilities,
    surface_format: wgpu::TextureFormat,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    config: RenderConfig,
    depth: Option<wgpu::TextureView>,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_layout: wgpu::BindGroupLayout,
    points_layout: wgpu::BindGroupLayout,
    mesh_front: wgpu::RenderPipeline,
    mesh_back: wgpu::RenderPipeline,
    mesh_wire: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    fallback_texture: wgpu::TextureView,
    textures: HashMap<AssetId, wgpu::TextureView>,
    objects: HashMap<ObjectId, GpuObject>,
    pending: Option<PendingFrame>,
    frames: u64,
}

impl WgpuPipeline {
    /// Create a device and surface for `target` (e.g. an `Arc<Window>`).
    pub fn new(target: impl Into<wgpu::SurfaceTarget<'static>>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("horizon_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self::with_device(surface, device, queue, caps, surface_format))
    }

    fn with_device(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        caps: wgpu::SurfaceCapabilities,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_layout"),
            entries: &[uniform_entry(0)],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_object_layout"),
            entries: &[
                uniform_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let points_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points_object_layout"),
            entries: &[uniform_entry(0)],
        });

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &mesh_layout],
            push_constant_ranges: &[],
        });
        let points_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("points_pipeline_layout"),
                bind_group_layouts: &[&camera_layout, &points_layout],
                push_constant_ranges: &[],
            });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let points_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POINTS_SHADER.into()),
        });

        let mesh_pipeline = |label: &str,
                             fragment: &str,
                             topology: wgpu::PrimitiveTopology,
                             cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&mesh_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &mesh_shader,
                    entry_point: Some("vs_mesh"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &mesh_shader,
                    entry_point: Some(fragment),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let mesh_front = mesh_pipeline(
            "mesh_front",
            "fs_mesh",
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
        );
        let mesh_back = mesh_pipeline(
            "mesh_back",
            "fs_mesh",
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Front),
        );
        let mesh_wire = mesh_pipeline(
            "mesh_wire",
            "fs_wire",
            wgpu::PrimitiveTopology::LineList,
            None,
        );

        let points = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points"),
            layout: Some(&points_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &points_shader,
                entry_point: Some("vs_points"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &points_shader,
                entry_point: Some("fs_points"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("equirect_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let fallback_texture =
            upload_texture(&device, &queue, &TextureData::solid([4, 6, 14, 255]), "fallback");

        Self {
            surface,
            device,
            queue,
            caps,
            surface_format,
            surface_config: None,
            config: RenderConfig::default(),
            depth: None,
            camera_buffer,
            camera_bind_group,
            mesh_layout,
            points_layout,
            mesh_front,
            mesh_back,
            mesh_wire,
            points,
            sampler,
            fallback_texture,
            textures: HashMap::new(),
            objects: HashMap::new(),
            pending: None,
            frames: 0,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Let `overlay` paint over the composited frame, then present it.
    /// Does nothing when no frame is pending.
    pub fn finish_frame(&mut self, overlay: impl FnOnce(&OverlayTarget<'_>)) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let size_in_pixels = self
            .surface_config
            .as_ref()
            .map(|c| [c.width, c.height])
            .unwrap_or([1, 1]);
        overlay(&OverlayTarget {
            device: &self.device,
            queue: &self.queue,
            view: &pending.view,
            size_in_pixels,
        });
        pending.texture.present();
    }

    /// Present the pending frame without overlays.
    pub fn present(&mut self) {
        self.finish_frame(|_| {});
    }

    fn configure_surface(&mut self) {
        let (width, height) = self.config.physical_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: self
                .caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        self.surface.configure(&self.device, &surface_config);
        self.depth = Some(create_depth_texture(&self.device, width, height));
        self.surface_config = Some(surface_config);
        tracing::debug!(width, height, "surface configured");
    }

    fn acquire(&mut self) -> Result<Option<PendingFrame>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Some(PendingFrame { texture, view }))
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost; reconfiguring");
                self.configure_surface();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; frame skipped");
                Ok(None)
            }
            Err(e) => Err(RenderError::Surface(e.to_string())),
        }
    }

    fn texture_for(&mut self, resources: &ResourceSet, name: &str) -> Option<AssetId> {
        let id = resources.asset_id(name)?;
        if !self.textures.contains_key(&id) {
            let data = resources.texture(name)?;
            let view = upload_texture(&self.device, &self.queue, data, name);
            tracing::debug!(name, width = data.width, height = data.height, "texture uploaded");
            self.textures.insert(id, view);
        }
        Some(id)
    }

    fn mesh_bind_group(
        &self,
        uniforms: &wgpu::Buffer,
        texture: Option<AssetId>,
    ) -> wgpu::BindGroup {
        let view = texture
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.fallback_texture);
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_object"),
            layout: &self.mesh_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn upload_mesh(&self, mesh: &Mesh, texture: Option<AssetId>) -> GpuObject {
        let data = mesh.geometry.build();
        let vertices: Vec<Vertex> = data
            .positions
            .iter()
            .zip(&data.normals)
            .zip(&data.uvs)
            .map(|((p, n), uv)| Vertex {
                position: *p,
                normal: *n,
                uv: *uv,
            })
            .collect();
        let edges = data.edge_indices();
        let uniforms = self.object_uniform_buffer();
        let bind_group = self.mesh_bind_group(&uniforms, texture);
        GpuObject {
            bind_group,
            uniforms,
            body: GpuBody::Mesh {
                vertices: self.buffer(
                    "mesh_vertices",
                    bytemuck::cast_slice(&vertices),
                    wgpu::BufferUsages::VERTEX,
                ),
                indices: self.buffer(
                    "mesh_indices",
                    bytemuck::cast_slice(&data.indices),
                    wgpu::BufferUsages::INDEX,
                ),
                index_count: data.indices.len() as u32,
                edges: self.buffer(
                    "mesh_edges",
                    bytemuck::cast_slice(&edges),
                    wgpu::BufferUsages::INDEX,
                ),
                edge_count: edges.len() as u32,
                bound_texture: texture,
            },
        }
    }

    fn upload_points(&self, cloud: &PointCloud) -> GpuObject {
        let instances: Vec<PointInstance> = cloud
            .positions
            .iter()
            .zip(&cloud.sizes)
            .zip(&cloud.colors)
            .map(|((p, size), color)| PointInstance {
                position: p.to_array(),
                size: *size,
                color: linear_color(*color),
            })
            .collect();
        let uniforms = self.object_uniform_buffer();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("points_object"),
            layout: &self.points_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        GpuObject {
            bind_group,
            uniforms,
            body: GpuBody::Points {
                instances: self.buffer(
                    "point_instances",
                    bytemuck::cast_slice(&instances),
                    wgpu::BufferUsages::VERTEX,
                ),
                count: instances.len() as u32,
            },
        }
    }

    fn object_uniform_buffer(&self) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniforms"),
            size: std::mem::size_of::<ObjectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn buffer(&self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
    }

    /// Upload new objects, rebind late textures and refresh per-object
    /// uniforms. Returns the ids to draw, in layer order.
    fn sync_objects(&mut self, frame: &Frame<'_>) -> Vec<ObjectId> {
        let view_proj = frame.camera.view_projection();
        let mut draw = Vec::new();
        let mut live = Vec::new();

        for layer in frame.layers.iter() {
            for object in layer.objects() {
                live.push(object.id);
                if !object.visible {
                    continue;
                }
                if object.frustum_culled
                    && !sphere_in_frustum(
                        view_proj,
                        object.transform.position,
                        bounding_radius(object),
                    )
                {
                    continue;
                }

                let texture = match &object.body {
                    Renderable::Mesh(mesh) => mesh
                        .material
                        .texture
                        .as_deref()
                        .and_then(|name| self.texture_for(frame.resources, name)),
                    Renderable::Points(_) => None,
                };

                if !self.objects.contains_key(&object.id) {
                    let gpu = match &object.body {
                        Renderable::Mesh(mesh) => self.upload_mesh(mesh, texture),
                        Renderable::Points(cloud) => self.upload_points(cloud),
                    };
                    tracing::debug!(layer = layer.kind().name(), name = %object.name, "object uploaded");
                    self.objects.insert(object.id, gpu);
                }

                let rebind = match self.objects.get(&object.id) {
                    Some(GpuObject {
                        body: GpuBody::Mesh { bound_texture, .. },
                        ..
                    }) => *bound_texture != texture,
                    _ => false,
                };
                if rebind {
                    let Some(gpu) = self.objects.get(&object.id) else {
                        continue;
                    };
                    let bind_group = self.mesh_bind_group(&gpu.uniforms, texture);
                    if let Some(gpu) = self.objects.get_mut(&object.id) {
                        gpu.bind_group = bind_group;
                        if let GpuBody::Mesh { bound_texture, .. } = &mut gpu.body {
                            *bound_texture = texture;
                        }
                    }
                }

                if let Some(gpu) = self.objects.get(&object.id) {
                    let uniforms = object_uniforms(object, texture.is_some());
                    self.queue
                        .write_buffer(&gpu.uniforms, 0, bytemuck::bytes_of(&uniforms));
                    draw.push(object.id);
                }
            }
        }

        self.objects.retain(|id, _| live.contains(id));
        draw
    }

    fn draw(&self, frame: &Frame<'_>, target: &wgpu::TextureView, draw: &[ObjectId]) {
        let Some(depth) = &self.depth else {
            return;
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("horizon_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("layers_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for layer in frame.layers.iter() {
                for object in layer.objects() {
                    if !draw.contains(&object.id) {
                        continue;
                    }
                    let Some(gpu) = self.objects.get(&object.id) else {
                        continue;
                    };
                    match (&gpu.body, &object.body) {
                        (
                            GpuBody::Mesh {
                                vertices,
                                indices,
                                index_count,
                                edges,
                                edge_count,
                                ..
                            },
                            Renderable::Mesh(mesh),
                        ) => {
                            pass.set_bind_group(1, &gpu.bind_group, &[]);
                            pass.set_vertex_buffer(0, vertices.slice(..));
                            if mesh.material.wireframe.get() {
                                pass.set_pipeline(&self.mesh_wire);
                                pass.set_index_buffer(edges.slice(..), wgpu::IndexFormat::Uint32);
                                pass.draw_indexed(0..*edge_count, 0, 0..1);
                            } else {
                                pass.set_pipeline(match mesh.material.side {
                                    Side::Front => &self.mesh_front,
                                    Side::Back => &self.mesh_back,
                                });
                                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                                pass.draw_indexed(0..*index_count, 0, 0..1);
                            }
                        }
                        (GpuBody::Points { instances, count }, Renderable::Points(_)) => {
                            pass.set_pipeline(&self.points);
                            pass.set_bind_group(1, &gpu.bind_group, &[]);
                            pass.set_vertex_buffer(0, instances.slice(..));
                            pass.draw(0..6, 0..*count);
                        }
                        _ => {}
                    }
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderPipeline for WgpuPipeline {
    fn attach(
        &mut self,
        _target: &dyn TargetSurface,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        self.config = *config;
        self.configure_surface();
        Ok(())
    }

    fn update(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        if self.surface_config.is_none() {
            return Err(RenderError::NotAttached);
        }
        // A frame nobody finished is presented as-is.
        if let Some(stale) = self.pending.take() {
            stale.texture.present();
        }

        let camera = frame.camera;
        let (width, height) = self.config.physical_size();
        let uniforms = CameraUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: camera.eye().extend(1.0).to_array(),
            viewport: [width as f32, height as f32, self.config.pixel_ratio as f32, 0.0],
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms));

        let draw = self.sync_objects(frame);
        let Some(pending) = self.acquire()? else {
            return Ok(());
        };
        self.draw(frame, &pending.view, &draw);
        self.pending = Some(pending);
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, config: &RenderConfig) {
        if let Some(stale) = self.pending.take() {
            stale.texture.present();
        }
        self.config = *config;
        if self.surface_config.is_some() {
            self.configure_surface();
        }
    }

    fn space_height(&self) -> f32 {
        self.config.height
    }
}

fn object_uniforms(object: &SceneObject, textured: bool) -> ObjectUniforms {
    let t = &object.transform;
    let model = Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position);
    let (color, params) = match &object.body {
        Renderable::Mesh(mesh) => (
            linear_color(mesh.material.color),
            Vec4::new(if textured { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0),
        ),
        Renderable::Points(cloud) => (
            [1.0; 4],
            Vec4::new(
                0.0,
                cloud.material.size_scale,
                cloud.material.view_height.get(),
                0.0,
            ),
        ),
    };
    ObjectUniforms {
        model: model.to_cols_array_2d(),
        color,
        params: params.to_array(),
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &TextureData,
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: data.width.max(1),
                height: data.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data.rgba,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_render::CameraRig;

    #[test]
    fn srgb_endpoints_and_midtone() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
    }

    #[test]
    fn uniform_layouts_are_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<PointInstance>(), 32);
    }

    #[test]
    fn frustum_keeps_origin_and_drops_behind() {
        let camera = CameraRig::new(&RenderConfig {
            pixel_ratio: 1.0,
            width: 1280.0,
            height: 720.0,
        });
        let vp = camera.view_projection();
        assert!(sphere_in_frustum(vp, Vec3::ZERO, 5.0));
        // The default rig looks from +z toward the origin.
        assert!(!sphere_in_frustum(vp, Vec3::new(0.0, 4.0, 200.0), 5.0));
        // Large enough to wrap the camera.
        assert!(sphere_in_frustum(vp, Vec3::new(0.0, 4.0, 200.0), 500.0));
    }
}
