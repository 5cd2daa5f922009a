//! Desktop window backend for interactive sessions.
//!
//! Every mesh node is drawn as an instanced, sun-lit box: cuboids at their
//! own size and planes as thin slabs. The window's client area is the
//! render surface, so mouse presses map straight to pointer events.

use super::{Camera, FrameInputs, FrameSubmission, RenderBackend, RenderError, RenderResult};
use crate::app::{EditorApp, EditorError};
use crate::assets::AssetLoader;
use crate::config::{EditorConfig, SurfaceConfig};
use crate::editor::{ControlEdit, PointerEvent};
use crate::render::SurfaceRect;
use crate::scene::{Geometry, NodeKind, SceneGraph, TextureSlot};
use crate::world::orientation::wrap_azimuth;
use glam::{Mat4, Vec3};
use pollster::block_on;
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const PLANE_THICKNESS: f32 = 0.01;
/// Drawn in place of a loaded ground image; textures are not sampled.
const TEXTURED_TINT: u32 = 0x9aa58c;
const ANGLE_STEP_DEGREES: f32 = 5.0;

const SHADER: &str = r#"
struct Globals {
    view_projection: mat4x4<f32>,
    sun_direction: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) emissive: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) emissive: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    var out: VertexOutput;
    out.clip = globals.view_projection * model * vec4<f32>(vertex.position, 1.0);
    out.normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color.rgb;
    out.emissive = instance.emissive.rgb;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(normalize(in.normal), globals.sun_direction.xyz), 0.0) * globals.sun_direction.w;
    let light = globals.ambient.x * 0.35 + diffuse * 0.65;
    return vec4<f32>(in.color * light + in.emissive, 1.0);
}
"#;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_projection: [[f32; 4]; 4],
    sun_direction: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Instance {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
}

impl Instance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

struct BoxPipeline {
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
}

struct WindowSurface {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    window: Arc<Window>,
    depth_view: wgpu::TextureView,
}

pub struct WindowBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    clear_color: wgpu::Color,
    enable_vsync: bool,
    surface: Option<WindowSurface>,
    pipeline: Option<BoxPipeline>,
}

impl WindowBackend {
    pub fn initialize(config: &SurfaceConfig) -> RenderResult<Self> {
        block_on(Self::initialize_async(config))
    }

    async fn initialize_async(config: &SurfaceConfig) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                RenderError::Backend("no compatible GPU adapter for window rendering".to_string())
            })?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Solar Layout Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|err| RenderError::Backend(format!("failed to create wgpu device: {err}")))?;

        log::info!(
            "[render] window backend initialized (adapter: {:?})",
            adapter.get_info().name
        );

        let [r, g, b, _] = hex_to_linear(config.clear_color);
        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            enable_vsync: config.enable_vsync,
            surface: None,
            pipeline: None,
        })
    }

    pub fn create_window_surface(&mut self, window: Arc<Window>) -> RenderResult<()> {
        let surface = self
            .instance
            .create_surface(Arc::clone(&window))
            .map_err(|err| RenderError::Backend(format!("failed to create surface: {err}")))?;

        let capabilities = surface.get_capabilities(&self.adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Backend("surface reports no formats".to_string()))?;

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if self.enable_vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&self.device, &surface_config);

        let depth_view = self.create_depth_view(surface_config.width, surface_config.height);
        self.pipeline = Some(self.create_pipeline(format));
        self.surface = Some(WindowSurface {
            surface,
            surface_config,
            window,
            depth_view,
        });

        log::info!(
            "[render] window surface configured ({}x{}, format: {:?})",
            size.width,
            size.height,
            format
        );
        Ok(())
    }

    fn create_depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
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
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_pipeline(&self, surface_format: wgpu::TextureFormat) -> BoxPipeline {
        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Box Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let globals_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Globals Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let globals_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Box Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Box Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::desc(), Instance::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        let (vertices, indices) = unit_cube();
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let instance_capacity = 64;
        let instance_buffer = self.create_instance_buffer(instance_capacity);

        BoxPipeline {
            render_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            instance_buffer,
            instance_capacity,
            globals_buffer,
            globals_bind_group,
        }
    }

    fn create_instance_buffer(&self, capacity: usize) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Box Instances"),
            size: (capacity * std::mem::size_of::<Instance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Handles a failed frame acquisition. Transient failures skip the
    /// frame; a lost or outdated swapchain is reconfigured for the next one.
    fn recover_frame(
        &mut self,
        err: wgpu::SurfaceError,
        inputs: &FrameInputs,
    ) -> RenderResult<FrameSubmission> {
        match SurfaceRecovery::for_error(&err) {
            SurfaceRecovery::Skip => {
                log::debug!("[render] frame {} skipped: {err}", inputs.frame_index);
            }
            SurfaceRecovery::Reconfigure => {
                log::warn!("[render] frame {} skipped, reconfiguring surface: {err}", inputs.frame_index);
                self.reconfigure_surface();
            }
            SurfaceRecovery::Fatal => {
                return Err(RenderError::Backend(format!("failed to acquire frame: {err}")));
            }
        }
        Ok(skipped_frame(inputs))
    }

    fn reconfigure_surface(&mut self) {
        let Some(size) = self.surface.as_ref().map(|surface| surface.window.inner_size()) else {
            return;
        };
        if size.width > 0 && size.height > 0 {
            self.resize(size.width, size.height);
        }
    }
}

impl WindowSurface {
    fn is_minimized(&self) -> bool {
        let size = self.window.inner_size();
        size.width == 0 || size.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceRecovery {
    Skip,
    Reconfigure,
    Fatal,
}

impl SurfaceRecovery {
    fn for_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Timeout => SurfaceRecovery::Skip,
            wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => SurfaceRecovery::Reconfigure,
            _ => SurfaceRecovery::Fatal,
        }
    }
}

fn skipped_frame(inputs: &FrameInputs) -> FrameSubmission {
    FrameSubmission {
        frame_index: inputs.frame_index,
        draw_count: 0,
    }
}

impl RenderBackend for WindowBackend {
    fn label(&self) -> &'static str {
        "Window Backend (Desktop)"
    }

    fn render_frame(
        &mut self,
        inputs: &FrameInputs,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> RenderResult<FrameSubmission> {
        let instances = collect_instances(scene);
        let globals = collect_globals(scene, camera);

        let grow = self
            .pipeline
            .as_ref()
            .is_some_and(|pipeline| pipeline.instance_capacity < instances.len());
        if grow {
            let capacity = instances.len().next_power_of_two();
            let buffer = self.create_instance_buffer(capacity);
            if let Some(pipeline) = self.pipeline.as_mut() {
                pipeline.instance_buffer = buffer;
                pipeline.instance_capacity = capacity;
            }
        }

        let (Some(surface), Some(pipeline)) = (self.surface.as_ref(), self.pipeline.as_ref()) else {
            log::warn!("[render] window backend not yet attached to a window, skipping frame");
            return Ok(skipped_frame(inputs));
        };
        if surface.is_minimized() {
            return Ok(skipped_frame(inputs));
        }

        let frame = match surface.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => return self.recover_frame(err, inputs),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&pipeline.globals_buffer, 0, bytemuck::cast_slice(&[globals]));
        self.queue.write_buffer(
            &pipeline.instance_buffer,
            0,
            bytemuck::cast_slice(&instances),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &surface.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !instances.is_empty() {
                pass.set_pipeline(&pipeline.render_pipeline);
                pass.set_bind_group(0, &pipeline.globals_bind_group, &[]);
                pass.set_vertex_buffer(0, pipeline.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, pipeline.instance_buffer.slice(..));
                pass.set_index_buffer(pipeline.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..pipeline.index_count, 0, 0..instances.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(FrameSubmission {
            frame_index: inputs.frame_index,
            draw_count: instances.len(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        let depth_view = self.create_depth_view(width, height);
        if let Some(surface) = self.surface.as_mut() {
            surface.surface_config.width = width.max(1);
            surface.surface_config.height = height.max(1);
            surface.surface.configure(&self.device, &surface.surface_config);
            surface.depth_view = depth_view;
            log::debug!("[render] window resized to {width}x{height}");
        }
    }

    fn dispose(&mut self) {
        self.pipeline = None;
        if self.surface.take().is_some() {
            log::debug!("[render] window surface released");
        }
    }
}

/// Opens a window and runs the editor in it until the window closes.
pub fn run_desktop(config: EditorConfig, loader: Box<dyn AssetLoader>) -> Result<(), EditorError> {
    let event_loop = EventLoop::new()
        .map_err(|err| RenderError::Backend(format!("failed to create event loop: {err}")))?;

    let window = WindowBuilder::new()
        .with_title(config.surface.title.clone())
        .with_inner_size(LogicalSize::new(config.surface.width, config.surface.height))
        .build(&event_loop)
        .map_err(|err| RenderError::Backend(format!("failed to create window: {err}")))?;
    let window = Arc::new(window);

    let mut backend = WindowBackend::initialize(&config.surface)?;
    backend.create_window_surface(Arc::clone(&window))?;

    let size = window.inner_size();
    let mut app = EditorApp::new(config);
    app.init(
        Some(Box::new(backend)),
        SurfaceRect::from_size(size.width as f32, size.height as f32),
        loader,
    )?;

    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut last_frame = Instant::now();

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    log::info!("[render] window close requested");
                    target.exit();
                }
                WindowEvent::Resized(size) => {
                    app.resize(size.width as f32, size.height as f32);
                }
                WindowEvent::CursorMoved { position, .. } => cursor = position,
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    app.pointer_down(PointerEvent::on_surface(cursor.x as f32, cursor.y as f32));
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => handle_key(&mut app, &logical_key, target),
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let delta_seconds = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;
                    match app.tick(delta_seconds) {
                        Ok(_) => {}
                        Err(err) if err.is_fatal() => {
                            log::error!("[render] fatal frame error: {err}");
                            target.exit();
                        }
                        Err(err) => log::warn!("[render] frame error: {err}"),
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                app.pump_asset_events();
                window.request_redraw();
            }
            Event::LoopExiting => app.destroy(),
            _ => {}
        })
        .map_err(|err| RenderError::Backend(format!("event loop failed: {err}")))?;

    Ok(())
}

fn handle_key(app: &mut EditorApp, key: &Key, target: &EventLoopWindowTarget<()>) {
    let selected = app
        .store()
        .selected()
        .map(|panel| (panel.tilt_degrees(), panel.azimuth_degrees()));

    let edit = match key {
        Key::Named(NamedKey::Escape) => {
            target.exit();
            return;
        }
        Key::Named(NamedKey::Delete) | Key::Named(NamedKey::Backspace) => ControlEdit::RemovePanel,
        Key::Character(text) if text.eq_ignore_ascii_case("p") => {
            ControlEdit::PlacementMode(!app.picking().placement_mode())
        }
        Key::Named(NamedKey::ArrowUp) => match selected {
            Some((tilt, _)) => ControlEdit::PanelTilt(tilt + ANGLE_STEP_DEGREES),
            None => return,
        },
        Key::Named(NamedKey::ArrowDown) => match selected {
            Some((tilt, _)) => ControlEdit::PanelTilt(tilt - ANGLE_STEP_DEGREES),
            None => return,
        },
        Key::Named(NamedKey::ArrowRight) => match selected {
            Some((_, azimuth)) => ControlEdit::PanelAzimuth(wrap_azimuth(azimuth + ANGLE_STEP_DEGREES)),
            None => return,
        },
        Key::Named(NamedKey::ArrowLeft) => match selected {
            Some((_, azimuth)) => ControlEdit::PanelAzimuth(wrap_azimuth(azimuth - ANGLE_STEP_DEGREES)),
            None => return,
        },
        _ => return,
    };
    app.apply_control(edit);
}

fn collect_instances(scene: &SceneGraph) -> Vec<Instance> {
    scene
        .iter()
        .filter_map(|(_, node)| {
            let NodeKind::Mesh { geometry, material } = &node.kind else {
                return None;
            };
            let local = match *geometry {
                Geometry::Cuboid { size, offset } => {
                    Mat4::from_translation(offset) * Mat4::from_scale(size)
                }
                Geometry::Plane { size } => {
                    Mat4::from_translation(Vec3::new(0.0, -PLANE_THICKNESS * 0.5, 0.0))
                        * Mat4::from_scale(Vec3::new(size.x, PLANE_THICKNESS, size.y))
                }
            };
            let color = match material.texture {
                TextureSlot::Loaded { .. } => TEXTURED_TINT,
                _ => material.color,
            };
            Some(Instance {
                model: (node.transform.matrix() * local).to_cols_array_2d(),
                color: hex_to_linear(color),
                emissive: hex_to_linear(material.emissive),
            })
        })
        .collect()
}

fn collect_globals(scene: &SceneGraph, camera: &Camera) -> Globals {
    let mut sun_direction = [0.0, 1.0, 0.0, 0.0];
    let mut ambient = [0.0; 4];
    for (_, node) in scene.iter() {
        match node.kind {
            NodeKind::DirectionalLight {
                intensity, target, ..
            } => {
                let direction = (node.transform.translation - target).normalize_or_zero();
                sun_direction = direction.extend(intensity).to_array();
            }
            NodeKind::AmbientLight { intensity, .. } => ambient[0] = intensity,
            NodeKind::Mesh { .. } => {}
        }
    }
    Globals {
        view_projection: camera.view_projection().to_cols_array_2d(),
        sun_direction,
        ambient,
    }
}

fn hex_to_linear(color: u32) -> [f32; 4] {
    let channel = |shift: u32| (((color >> shift) & 0xff) as f32 / 255.0).powf(2.2);
    [channel(16), channel(8), channel(0), 1.0]
}

#[rustfmt::skip]
fn unit_cube() -> (Vec<Vertex>, Vec<u16>) {
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]]),
        ([0.0, 0.0, -1.0], [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]]),
        ([-1.0, 0.0, 0.0], [[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]]),
        ([1.0, 0.0, 0.0], [[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]]),
        ([0.0, 1.0, 0.0], [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]]),
        ([0.0, -1.0, 0.0], [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, corners)) in faces.iter().enumerate() {
        let base = (face * 4) as u16;
        vertices.extend(corners.iter().map(|&position| Vertex { position, normal: *normal }));
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}
