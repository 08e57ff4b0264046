// renderer/gpu.rs
use std::{mem, num::NonZeroU64, sync::Arc};

use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use super::{Depth, MeshCache, ObjectData, SceneUniform, Vertex};
use crate::scene::ComposedScene;
use crate::settings::WindowSettings;

const INITIAL_OBJECTS_CAPACITY: u32 = 64;

/// What an overlay pass gets to draw on top of the lit scene.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub surface_size: [u32; 2],
}

pub struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: Depth,

    pipeline: wgpu::RenderPipeline,
    scene_bind_group: wgpu::BindGroup,
    scene_buf: wgpu::Buffer,

    objects_buf: wgpu::Buffer,
    objects_capacity: u32,
    objects_bind_group: wgpu::BindGroup,
    objects_bind_layout: wgpu::BindGroupLayout,
    objects_scratch: Vec<ObjectData>,

    meshes: MeshCache,
}

impl Gpu {
    pub async fn new(window: Arc<Window>, settings: &WindowSettings) -> Result<Self, String> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|err| format!("Failed to create surface: {}", err))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| format!("No suitable adapter: {}", err))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| format!("Failed to create device: {}", err))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| "Surface reports no formats".to_string())?;

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth = Depth::new(&device, size);

        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SceneBuffer"),
            contents: bytemuck::bytes_of(&SceneUniform::new()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SceneBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(mem::size_of::<SceneUniform>() as u64),
                },
                count: None,
            }],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SceneBindGroup"),
            layout: &scene_bind_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        let objects_bind_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ObjectsBindLayout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let objects_capacity = INITIAL_OBJECTS_CAPACITY;
        let objects_buf = create_objects_buffer(&device, objects_capacity);
        let objects_bind_group = create_objects_bind_group(&device, &objects_bind_layout, &objects_buf);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("PipelineLayout"),
            bind_group_layouts: &[&scene_bind_layout, &objects_bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // glTF models are not guaranteed to be closed; the shader lights both sides.
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
                strip_index_format: None,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth.format(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::info!(
            "GPU ready: {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth,
            pipeline,
            scene_bind_group,
            scene_buf,
            objects_buf,
            objects_capacity,
            objects_bind_group,
            objects_bind_layout,
            objects_scratch: Vec::with_capacity(INITIAL_OBJECTS_CAPACITY as usize),
            meshes: MeshCache::default(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth.fit(&self.device, new_size);
    }

    pub fn render(&mut self, scene: &ComposedScene) -> Result<(), wgpu::SurfaceError> {
        self.render_with_overlay(scene, |_| {})
    }

    /// Draws the composed scene, then lets `overlay` record passes that load
    /// the lit frame.
    pub fn render_with_overlay<F>(
        &mut self,
        scene: &ComposedScene,
        overlay: F,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&mut OverlayTarget<'_>),
    {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        let uniform = SceneUniform::from_scene(scene, self.aspect());
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(&uniform));

        self.objects_scratch.clear();
        for instance in &scene.models {
            self.objects_scratch.extend(instance.model.meshes().iter().map(|mesh| {
                ObjectData::new(instance.transform * mesh.transform, mesh.base_color)
            }));
        }
        self.ensure_objects_capacity(self.objects_scratch.len() as u32);
        if !self.objects_scratch.is_empty() {
            self.queue.write_buffer(
                &self.objects_buf,
                0,
                bytemuck::cast_slice(&self.objects_scratch),
            );
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.environment.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.scene_bind_group, &[]);
            rpass.set_bind_group(1, &self.objects_bind_group, &[]);

            let mut object_index = 0u32;
            for instance in &scene.models {
                let meshes = self.meshes.get_or_upload(&self.device, &instance.model);
                for mesh in meshes {
                    if mesh.index_count() > 0 {
                        rpass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
                        rpass.set_index_buffer(
                            mesh.index_buffer().slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        rpass.draw_indexed(0..mesh.index_count(), 0, object_index..object_index + 1);
                    }
                    object_index += 1;
                }
            }
        }

        overlay(&mut OverlayTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            surface_size: [self.config.width, self.config.height],
        });

        self.queue.submit(Some(encoder.finish()));
        frame.present();

        if scene.models.is_empty() {
            self.meshes.prune();
        }
        Ok(())
    }

    fn ensure_objects_capacity(&mut self, required: u32) {
        if required <= self.objects_capacity {
            return;
        }
        let new_capacity = required.max(self.objects_capacity * 2);
        log::info!(
            "Growing objects buffer: {} -> {}",
            self.objects_capacity,
            new_capacity
        );

        self.objects_buf = create_objects_buffer(&self.device, new_capacity);
        self.objects_bind_group =
            create_objects_bind_group(&self.device, &self.objects_bind_layout, &self.objects_buf);
        self.objects_capacity = new_capacity;
    }
}

fn create_objects_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("ObjectsBuffer"),
        size: (capacity as usize * mem::size_of::<ObjectData>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_objects_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ObjectsBindGroup"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
