//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in fragment shader using signed distance fields.
//! The renderer only reads `GameState`; glitch bands use their own RNG so
//! drawing never perturbs the simulation.

use bytemuck::{Pod, Zeroable};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use wgpu::util::DeviceExt;

use crate::consts::*;
use crate::ground_line;
use crate::settings::Settings;
use crate::sim::{GameState, ObstacleKind, Rgb};

/// Maximum number of obstacles drawn (must match shader)
pub const MAX_OBSTACLES: usize = 32;
/// Maximum number of pickups drawn (must match shader)
pub const MAX_PICKUPS: usize = 8;

const FLAG_SHIELD: u32 = 1;
const FLAG_JUMPING: u32 = 2;
const FLAG_GRID: u32 = 4;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub resolution: [f32; 2], // offset 0
    pub time: f32,            // offset 8
    pub frame: f32,           // offset 12
    pub field: [f32; 2],      // offset 16
    pub ground_y: f32,        // offset 24
    pub bg_offset: f32,       // offset 28
    pub runner: [f32; 4],     // offset 32 - x, y, w, h
    pub speed: f32,           // offset 48
    pub obstacle_count: u32,  // offset 52
    pub pickup_count: u32,    // offset 56
    pub flags: u32,           // offset 60
    pub glitch: [f32; 4],     // offset 64 - y, height, active, dust count
    pub bg: [f32; 4],         // offset 80
    pub ground: [f32; 4],     // offset 96
    pub accent: [f32; 4],     // offset 112
    pub player: [f32; 4],     // offset 128
    pub obstacle: [f32; 4],   // offset 144
    pub secondary: [f32; 4],  // offset 160
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ObstacleData {
    pub rect: [f32; 4],
    pub kind: u32, // 0 = ground, 1 = flying
    pub _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PickupData {
    pub rect: [f32; 4],
    pub kind: u32, // 0 = shield, 1 = slow-mo, 2 = double jump
    pub _pad: [u32; 3],
}

/// A glitch band for one frame
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlitchBand {
    pub y: f32,
    pub height: f32,
}

impl GlitchBand {
    /// Roll for a band with the given per-frame probability
    pub fn roll(rng: &mut impl Rng, probability: f32) -> Option<Self> {
        if rng.random::<f32>() < probability {
            Some(Self {
                y: rng.random::<f32>() * FIELD_HEIGHT,
                height: rng.random::<f32>() * 20.0,
            })
        } else {
            None
        }
    }
}

/// Errors while bringing up the GPU surface
#[derive(Debug, thiserror::Error)]
pub enum RenderInitError {
    #[error(transparent)]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
}

/// Prefer a non-sRGB format: palette colours are already sRGB-encoded
pub fn pick_surface_format(
    formats: &[wgpu::TextureFormat],
) -> Result<wgpu::TextureFormat, RenderInitError> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .ok_or(RenderInitError::NoSurfaceFormat)
}

fn color(rgb: Rgb) -> [f32; 4] {
    let [r, g, b] = rgb.to_f32();
    [r, g, b, 1.0]
}

/// Pack the per-frame uniform block from the current state
pub fn build_globals(
    state: &GameState,
    settings: &Settings,
    resolution: (u32, u32),
    time_secs: f32,
    glitch: Option<GlitchBand>,
) -> Globals {
    let palette = state.phase().palette;
    let runner = &state.runner;

    let mut flags = 0;
    if runner.power_up == Some(crate::sim::PowerUpKind::Shield) {
        flags |= FLAG_SHIELD;
    }
    if runner.jumping {
        flags |= FLAG_JUMPING;
    }
    if settings.quality.grid_enabled() {
        flags |= FLAG_GRID;
    }

    let glitch = match glitch {
        Some(band) => [band.y, band.height, 1.0, 0.0],
        None => [0.0; 4],
    };

    Globals {
        resolution: [resolution.0 as f32, resolution.1 as f32],
        time: time_secs,
        frame: state.frame_count as f32,
        field: [FIELD_WIDTH, FIELD_HEIGHT],
        ground_y: ground_line(),
        bg_offset: state.bg_offset,
        runner: [runner.pos.x, runner.pos.y, runner.size.x, runner.size.y],
        speed: state.speed as f32,
        obstacle_count: state.obstacles.len().min(MAX_OBSTACLES) as u32,
        pickup_count: state.pickups.len().min(MAX_PICKUPS) as u32,
        flags,
        glitch: [
            glitch[0],
            glitch[1],
            glitch[2],
            settings.quality.dust_count() as f32,
        ],
        bg: color(palette.bg),
        ground: color(palette.ground),
        accent: color(palette.accent),
        player: color(palette.player),
        obstacle: color(palette.obstacle),
        secondary: color(palette.secondary),
    }
}

/// Fixed-size obstacle array for the uniform buffer
pub fn build_obstacles(state: &GameState) -> [ObstacleData; MAX_OBSTACLES] {
    let mut data = [ObstacleData::zeroed(); MAX_OBSTACLES];
    for (slot, obs) in data.iter_mut().zip(&state.obstacles) {
        *slot = ObstacleData {
            rect: [obs.pos.x, obs.pos.y, obs.size.x, obs.size.y],
            kind: match obs.kind {
                ObstacleKind::Ground => 0,
                ObstacleKind::Flying => 1,
            },
            _pad: [0; 3],
        };
    }
    data
}

/// Fixed-size pickup array for the uniform buffer
pub fn build_pickups(state: &GameState) -> [PickupData; MAX_PICKUPS] {
    let mut data = [PickupData::zeroed(); MAX_PICKUPS];
    for (slot, pickup) in data.iter_mut().zip(&state.pickups) {
        *slot = PickupData {
            rect: [pickup.pos.x, pickup.pos.y, pickup.size.x, pickup.size.y],
            kind: pickup.kind.gpu_index(),
            _pad: [0; 3],
        };
    }
    data
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    // Uniform buffers
    globals_buffer: wgpu::Buffer,
    obstacles_buffer: wgpu::Buffer,
    pickups_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
    glitch_rng: Pcg32,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderInitError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = pick_surface_format(&surface_caps.formats)?;

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let obstacles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("obstacles"),
            size: (std::mem::size_of::<ObstacleData>() * MAX_OBSTACLES) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pickups_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pickups"),
            size: (std::mem::size_of::<PickupData>() * MAX_PICKUPS) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1), uniform_entry(2)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: obstacles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: pickups_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            obstacles_buffer,
            pickups_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
            glitch_rng: Pcg32::seed_from_u64(width as u64 ^ ((height as u64) << 32)),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms from requestAnimationFrame, convert to seconds
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let probability = settings.effective_glitch(state.phase().glitch_intensity);
        let glitch = GlitchBand::roll(&mut self.glitch_rng, probability);

        let globals = build_globals(state, settings, self.size, elapsed, glitch);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue.write_buffer(
            &self.obstacles_buffer,
            0,
            bytemuck::cast_slice(&build_obstacles(state)),
        );
        self.queue.write_buffer(
            &self.pickups_buffer,
            0,
            bytemuck::cast_slice(&build_pickups(state)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
