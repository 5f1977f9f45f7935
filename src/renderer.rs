use std::collections::BTreeMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::TubeConfig;
use crate::error::AppError;
use crate::geometry::{build_sphere, build_tube, Mesh};
use crate::matrix_operations::{flatten_matrix_for_wgpu, view_projection};
use crate::mesh_pass::{
    GlobalsUniformBufferInput, GpuMesh, InstanceBufferInput, MeshBindings, MeshPass, DEPTH_FORMAT,
};
use crate::scene::{Renderable, RenderableKey, SceneReconciler, SceneSnapshot, SceneView};
use crate::space_curve::TunnelCurve;

const TUNNEL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const PLAYER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const OBSTACLE_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
const SPHERE_SEGMENTS: usize = 32;
const INITIAL_SPHERE_CAPACITY: usize = 64;

pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_mesh(device: &wgpu::Device, label: &str, mesh: &Mesh) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Vertex Buffer")),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Index Buffer")),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    }
}

fn create_sphere_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sphere Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceBufferInput>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn sphere_instance(renderable: &Renderable) -> InstanceBufferInput {
    let color = match renderable.key {
        RenderableKey::Player => PLAYER_COLOR,
        RenderableKey::Obstacle(_) => OBSTACLE_COLOR,
    };
    InstanceBufferInput {
        offset: renderable.position.into(),
        scale: renderable.radius,
        color,
    }
}

/// Draws scene snapshots into a window: the tunnel tube plus one instanced
/// sphere per renderable.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    mesh_pass: MeshPass,
    bindings: MeshBindings,
    globals_uniform: wgpu::Buffer,
    tunnel: GpuMesh,
    tunnel_instance: wgpu::Buffer,
    sphere: GpuMesh,
    sphere_instances: wgpu::Buffer,
    sphere_capacity: usize,
    sphere_count: u32,
    reconciler: SceneReconciler,
    shown: BTreeMap<RenderableKey, InstanceBufferInput>,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        curve: &TunnelCurve,
        tube: &TubeConfig,
    ) -> Result<Self, AppError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(AppError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default()
                    },
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        let config = surface
            .get_default_config(&adapter, width, height)
            .ok_or(AppError::UnsupportedSurface)?;
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, width, height);

        let globals_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Uniform Buffer"),
            contents: bytemuck::cast_slice(&[GlobalsUniformBufferInput::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let mesh_pass = MeshPass::new(&device, config.format);
        let bindings = MeshBindings::new(&device, &mesh_pass, &globals_uniform);

        let tube_mesh = build_tube(curve, tube.tubular_segments, tube.radius, tube.radial_segments, true);
        log::debug!(
            "tunnel mesh: {} vertices, {} triangles",
            tube_mesh.vertices.len(),
            tube_mesh.indices.len() / 3
        );
        let tunnel = upload_mesh(&device, "Tunnel", &tube_mesh);
        let tunnel_instance = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Tunnel Instance Buffer"),
            contents: bytemuck::cast_slice(&[InstanceBufferInput {
                offset: [0.0; 3],
                scale: 1.0,
                color: TUNNEL_COLOR,
            }]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Unit sphere; each instance scales it to its own radius.
        let sphere = upload_mesh(
            &device,
            "Sphere",
            &build_sphere(1.0, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
        );
        let sphere_instances = create_sphere_instance_buffer(&device, INITIAL_SPHERE_CAPACITY);

        Ok(Renderer {
            surface,
            device,
            queue,
            config,
            depth_view,
            mesh_pass,
            bindings,
            globals_uniform,
            tunnel,
            tunnel_instance,
            sphere,
            sphere_instances,
            sphere_capacity: INITIAL_SPHERE_CAPACITY,
            sphere_count: 0,
            reconciler: SceneReconciler::new(),
            shown: BTreeMap::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    fn sync_spheres(&mut self, scene: &SceneSnapshot) {
        let diff = self.reconciler.reconcile(scene);
        if diff.is_empty() {
            return;
        }
        for key in &diff.removed {
            self.shown.remove(key);
        }
        for renderable in diff.added.iter().chain(&diff.moved) {
            self.shown.insert(renderable.key, sphere_instance(renderable));
        }

        let instances: Vec<InstanceBufferInput> = self.shown.values().copied().collect();
        if instances.len() > self.sphere_capacity {
            self.sphere_capacity = instances.len().next_power_of_two();
            self.sphere_instances = create_sphere_instance_buffer(&self.device, self.sphere_capacity);
            log::debug!("grew sphere instance buffer to {}", self.sphere_capacity);
        }
        self.queue
            .write_buffer(&self.sphere_instances, 0, bytemuck::cast_slice(&instances));
        self.sphere_count = instances.len() as u32;
    }
}

impl SceneView for Renderer {
    fn draw(&mut self, scene: &SceneSnapshot) {
        self.sync_spheres(scene);
        self.queue.write_buffer(
            &self.globals_uniform,
            0,
            bytemuck::cast_slice(&[GlobalsUniformBufferInput {
                view_proj: flatten_matrix_for_wgpu(view_projection(&scene.camera, self.aspect())),
            }]),
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.mesh_pass
                .record(&mut rpass, &self.bindings, &self.tunnel, &self.tunnel_instance, 1);
            self.mesh_pass.record(
                &mut rpass,
                &self.bindings,
                &self.sphere,
                &self.sphere_instances,
                self.sphere_count,
            );
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}
