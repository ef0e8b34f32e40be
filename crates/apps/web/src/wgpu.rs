//! `wgpu` render backend bound to an HTML canvas (WebGPU, WebGL2 fallback).

#[cfg(target_arch = "wasm32")]
mod imp {
    use std::borrow::Cow;
    use std::cell::OnceCell;

    use ::wgpu::util::DeviceExt;
    use gpu::mesh::{self, MeshData};
    use gpu::raw::{ArcColorRaw, ArcVertexRaw, GlobalsRaw, InstanceRaw, MeshVertexRaw, PostRaw};
    use gpu::{RenderBackend, RenderError, RenderFrame, RenderSurface, SurfaceSize};
    use tracing::{debug, info};

    const GLOBALS_WGSL: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    scene: mat4x4<f32>,
    camera_time: vec4<f32>,
    fog: vec4<f32>,
    globe: vec4<f32>,
    fresnel_arc_time: vec4<f32>,
    atmosphere: vec4<f32>,
    ambient: vec4<f32>,
    key_light: vec4<f32>,
    key_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

fn lighting(n: vec3<f32>) -> vec3<f32> {
    let ndotl = max(dot(n, normalize(globals.key_dir.xyz)), 0.0);
    return globals.ambient.rgb * globals.ambient.w
        + globals.key_light.rgb * globals.key_light.w * ndotl;
}

// Exponential-squared fog over the distance a fragment sits behind the
// plane through the globe center, so the near hemisphere stays clear.
fn apply_fog(color: vec3<f32>, world: vec3<f32>) -> vec3<f32> {
    let cam = globals.camera_time.xyz;
    let behind = max(distance(cam, world) - length(cam), 0.0);
    let d = globals.fog.w * behind;
    let f = clamp(1.0 - exp(-d * d), 0.0, 1.0);
    return mix(color, globals.fog.rgb, f);
}
"#;

    const GLOBE_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) local: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> VsOut {
    let world = globals.scene * vec4<f32>(position, 1.0);
    let n = globals.scene * vec4<f32>(normal, 0.0);
    return VsOut(globals.view_proj * world, world.xyz, n.xyz, position);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let view_dir = normalize(globals.camera_time.xyz - in.world);
    let t = globals.camera_time.w;
    let detail = globals.globe.w;

    let p = in.local * detail * 6.0;
    let wave = sin(p.x + t * 0.11) * sin(p.y * 1.3) * sin(p.z - t * 0.07);
    let land = smoothstep(0.15, 0.55, wave * 0.5 + 0.5);
    let grid = max(
        1.0 - smoothstep(0.0, 0.04, abs(fract(p.y * 0.5) - 0.5)),
        1.0 - smoothstep(0.0, 0.04, abs(fract(atan2(in.local.z, in.local.x) * detail) - 0.5)),
    );

    let base = globals.globe.rgb * (0.7 + 0.6 * land) + globals.fresnel_arc_time.rgb * grid * 0.04;
    let rim = pow(1.0 - max(dot(n, view_dir), 0.0), 3.0);
    let color = base * lighting(n) + globals.fresnel_arc_time.rgb * rim * 0.8;
    return vec4<f32>(color, 1.0);
}
"#;

    const ATMOSPHERE_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> VsOut {
    let world = globals.scene * vec4<f32>(position * globals.atmosphere.w, 1.0);
    let n = globals.scene * vec4<f32>(normal, 0.0);
    return VsOut(globals.view_proj * world, world.xyz, n.xyz);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let view_dir = normalize(globals.camera_time.xyz - in.world);
    let facing = dot(normalize(in.normal), view_dir);
    // Only the far side of the shell glows, so the halo rings the limb.
    if (facing > 0.0) {
        return vec4<f32>(0.0);
    }
    let glow = pow(max(0.65 + facing, 0.0), 2.0);
    return vec4<f32>(globals.atmosphere.rgb * glow, 1.0);
}
"#;

    const MARKER_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) m0: vec4<f32>,
    @location(3) m1: vec4<f32>,
    @location(4) m2: vec4<f32>,
    @location(5) m3: vec4<f32>,
    @location(6) color: vec4<f32>,
) -> VsOut {
    let model = globals.scene * mat4x4<f32>(m0, m1, m2, m3);
    let world = model * vec4<f32>(position, 1.0);
    let n = model * vec4<f32>(normal, 0.0);
    return VsOut(globals.view_proj * world, world.xyz, n.xyz, color);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let lit = in.color.rgb * (0.45 + 0.55 * lighting(n)) + in.color.rgb * 0.35;
    return vec4<f32>(apply_fog(lit, in.world), in.color.a);
}
"#;

    const ARC_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) progress: f32,
    @location(3) phase: f32,
};

@vertex
fn vs_main(
    @location(0) position_progress: vec4<f32>,
    @location(1) normal_phase: vec4<f32>,
    @location(2) color: vec4<f32>,
) -> VsOut {
    let world = globals.scene * vec4<f32>(position_progress.xyz, 1.0);
    return VsOut(
        globals.view_proj * world,
        world.xyz,
        color,
        position_progress.w,
        normal_phase.w,
    );
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let t = globals.fresnel_arc_time.w;
    let flow = fract(in.progress * 6.0 - t * 0.6 + in.phase / 6.2831853);
    let dash = smoothstep(0.0, 0.25, flow) * (1.0 - smoothstep(0.55, 0.85, flow));
    let alpha = in.color.a * (0.3 + 0.7 * dash);
    let rgb = apply_fog(in.color.rgb, in.world) * alpha;
    return vec4<f32>(rgb, alpha);
}
"#;

    const POST_WGSL: &str = r#"
struct Post {
    bloom: vec4<f32>,
    vignette_fxaa: vec4<f32>,
    chroma_texel: vec4<f32>,
};

@group(0) @binding(0) var scene_tex: texture_2d<f32>;
@group(0) @binding(1) var scene_smp: sampler;
@group(0) @binding(2) var<uniform> post: Post;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vid: u32) -> VsOut {
    let x = f32((vid << 1u) & 2u);
    let y = f32(vid & 2u);
    return VsOut(vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0), vec2<f32>(x, y));
}

fn tap(uv: vec2<f32>) -> vec3<f32> {
    return textureSampleLevel(scene_tex, scene_smp, uv, 0.0).rgb;
}

fn luma(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let texel = post.chroma_texel.zw;
    let chroma = post.chroma_texel.xy;

    var color = vec3<f32>(
        tap(in.uv + chroma).r,
        tap(in.uv).g,
        tap(in.uv - chroma).b,
    );

    if (post.vignette_fxaa.z > 0.5) {
        let n = tap(in.uv + vec2<f32>(0.0, -texel.y));
        let s = tap(in.uv + vec2<f32>(0.0, texel.y));
        let e = tap(in.uv + vec2<f32>(texel.x, 0.0));
        let w = tap(in.uv + vec2<f32>(-texel.x, 0.0));
        let lumas = vec4<f32>(luma(n), luma(s), luma(e), luma(w));
        let contrast = max(max(lumas.x, lumas.y), max(lumas.z, lumas.w))
            - min(min(lumas.x, lumas.y), min(lumas.z, lumas.w));
        let blend = smoothstep(0.05, 0.25, contrast) * 0.5;
        color = mix(color, (n + s + e + w) * 0.25, blend);
    }

    var glow = vec3<f32>(0.0);
    for (var i = 0; i < 8; i = i + 1) {
        let a = f32(i) * 0.7853982;
        let dir = vec2<f32>(cos(a), sin(a)) * texel;
        let near = tap(in.uv + dir * 3.0);
        let far = tap(in.uv + dir * 7.0);
        glow = glow + max(near - vec3<f32>(post.bloom.y), vec3<f32>(0.0));
        glow = glow + max(far - vec3<f32>(post.bloom.y), vec3<f32>(0.0)) * 0.5;
    }
    color = color + glow * (post.bloom.x / 12.0);

    // Darkening vignette: 1 near the center, falling toward 0 at the corners.
    let darkness = post.vignette_fxaa.x;
    let offset = post.vignette_fxaa.y;
    let d = distance(in.uv, vec2<f32>(0.5)) * (darkness + offset);
    color = color * (1.0 - smoothstep(offset * 0.799, 0.8, d));
    return vec4<f32>(color, 1.0);
}
"#;

    thread_local! {
        static INSTANCE: OnceCell<&'static ::wgpu::Instance> = const { OnceCell::new() };
    }

    /// One instance per page. `wgpu::Surface` must not outlive it, so it is
    /// leaked for the lifetime of the module.
    fn instance() -> &'static ::wgpu::Instance {
        INSTANCE.with(|cell| {
            *cell.get_or_init(|| {
                Box::leak(Box::new(::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
                    backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                    ..Default::default()
                })))
            })
        })
    }

    /// A canvas whose GPU context has already been negotiated (or refused).
    pub struct CanvasSurface {
        css_width: f64,
        css_height: f64,
        device_pixel_ratio: f64,
        backend: Result<WgpuBackend, RenderError>,
    }

    impl CanvasSurface {
        pub async fn attach(
            canvas: web_sys::HtmlCanvasElement,
            device_pixel_ratio: f64,
            marker_radius: f64,
        ) -> Self {
            let css_width = f64::from(canvas.client_width());
            let css_height = f64::from(canvas.client_height());
            let size = SurfaceSize::from_css(css_width, css_height, device_pixel_ratio);
            let backend = WgpuBackend::create(canvas, size, marker_radius).await;
            Self {
                css_width,
                css_height,
                device_pixel_ratio,
                backend,
            }
        }
    }

    impl RenderSurface for CanvasSurface {
        type Backend = WgpuBackend;

        fn css_size(&self) -> (f64, f64) {
            (self.css_width, self.css_height)
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.device_pixel_ratio
        }

        fn acquire_backend(self) -> Result<WgpuBackend, RenderError> {
            self.backend
        }
    }

    struct MeshBuffers {
        vertices: ::wgpu::Buffer,
        indices: ::wgpu::Buffer,
        index_count: u32,
    }

    impl MeshBuffers {
        fn upload(device: &::wgpu::Device, label: &str, mesh: &MeshData) -> Self {
            Self {
                vertices: device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: ::wgpu::BufferUsages::VERTEX,
                }),
                indices: device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: ::wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.index_count(),
            }
        }
    }

    struct ArcBuffers {
        vertices: ::wgpu::Buffer,
        indices: ::wgpu::Buffer,
        colors: Option<::wgpu::Buffer>,
        vertex_count: usize,
    }

    /// Offscreen color target the post pass reads from.
    struct PostTarget {
        view: ::wgpu::TextureView,
        bind_group: ::wgpu::BindGroup,
    }

    struct Pipelines {
        globe: ::wgpu::RenderPipeline,
        atmosphere: ::wgpu::RenderPipeline,
        markers: ::wgpu::RenderPipeline,
        arcs: ::wgpu::RenderPipeline,
        post: ::wgpu::RenderPipeline,
    }

    pub struct WgpuBackend {
        canvas: web_sys::HtmlCanvasElement,
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        depth_view: ::wgpu::TextureView,
        pipelines: Pipelines,
        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        post_buffer: ::wgpu::Buffer,
        post_layout: ::wgpu::BindGroupLayout,
        post_sampler: ::wgpu::Sampler,
        post_target: PostTarget,
        globe: MeshBuffers,
        atmosphere: MeshBuffers,
        marker: MeshBuffers,
        instances: Option<::wgpu::Buffer>,
        instance_capacity: usize,
        arcs: Option<ArcBuffers>,
        released: bool,
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-depth"),
            size: ::wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn create_post_target(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        layout: &::wgpu::BindGroupLayout,
        sampler: &::wgpu::Sampler,
        uniforms: &::wgpu::Buffer,
    ) -> PostTarget {
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-scene-color"),
            size: ::wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: config.format,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT
                | ::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-post-bg"),
            layout,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ::wgpu::BindingResource::TextureView(&view),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::Sampler(sampler),
                },
                ::wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        });
        PostTarget { view, bind_group }
    }

    fn shader(device: &::wgpu::Device, label: &str, body: &str) -> ::wgpu::ShaderModule {
        device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Owned(format!("{GLOBALS_WGSL}{body}"))),
        })
    }

    const MESH_ATTRIBUTES: [::wgpu::VertexAttribute; 2] =
        ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    const INSTANCE_ATTRIBUTES: [::wgpu::VertexAttribute; 5] = ::wgpu::vertex_attr_array![
        2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4
    ];
    const ARC_ATTRIBUTES: [::wgpu::VertexAttribute; 2] =
        ::wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];
    const ARC_COLOR_ATTRIBUTES: [::wgpu::VertexAttribute; 1] =
        ::wgpu::vertex_attr_array![2 => Float32x4];

    fn mesh_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertexRaw>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRIBUTES,
        }
    }

    const ADDITIVE: ::wgpu::BlendState = ::wgpu::BlendState {
        color: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::One,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
        alpha: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::One,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
    };

    struct PipelineDesc<'a> {
        label: &'a str,
        module: &'a ::wgpu::ShaderModule,
        layout: &'a ::wgpu::PipelineLayout,
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        blend: ::wgpu::BlendState,
        depth_write: bool,
    }

    fn scene_pipeline(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        desc: PipelineDesc<'_>,
    ) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(desc.layout),
            vertex: ::wgpu::VertexState {
                module: desc.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: desc.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: desc.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(desc.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: desc.depth_write,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    impl WgpuBackend {
        async fn create(
            canvas: web_sys::HtmlCanvasElement,
            size: SurfaceSize,
            marker_radius: f64,
        ) -> Result<Self, RenderError> {
            let unavailable = |what: &str, e: &dyn std::fmt::Display| {
                RenderError::ContextUnavailable(format!("{what}: {e}"))
            };
            canvas.set_width(size.width);
            canvas.set_height(size.height);

            let instance = instance();
            let surface = instance
                .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
                .map_err(|e| unavailable("surface", &e))?;

            let adapter = instance
                .request_adapter(&::wgpu::RequestAdapterOptions {
                    power_preference: ::wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|e| unavailable("adapter", &e))?;

            let (device, queue) = adapter
                .request_device(&::wgpu::DeviceDescriptor {
                    label: Some("globe-device"),
                    required_features: ::wgpu::Features::empty(),
                    required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| unavailable("device", &e))?;

            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .ok_or_else(|| RenderError::ContextUnavailable("no surface format".into()))?;
            let alpha_mode = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

            let config = ::wgpu::SurfaceConfiguration {
                usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width.max(1),
                height: size.height.max(1),
                desired_maximum_frame_latency: 2,
                present_mode: ::wgpu::PresentMode::Fifo,
                alpha_mode,
                view_formats: vec![],
            };
            surface.configure(&device, &config);
            let depth_view = create_depth_view(&device, &config);

            let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("globe-globals"),
                size: std::mem::size_of::<GlobalsRaw>() as u64,
                usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let globals_layout =
                device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                    label: Some("globe-globals-bgl"),
                    entries: &[::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: ::wgpu::BindingType::Buffer {
                            ty: ::wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });
            let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("globe-globals-bg"),
                layout: &globals_layout,
                entries: &[::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                }],
            });

            let post_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("globe-post-uniforms"),
                size: std::mem::size_of::<PostRaw>() as u64,
                usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let post_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("globe-post-bgl"),
                entries: &[
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Texture {
                            sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: ::wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Buffer {
                            ty: ::wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });
            let post_sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
                label: Some("globe-post-sampler"),
                address_mode_u: ::wgpu::AddressMode::ClampToEdge,
                address_mode_v: ::wgpu::AddressMode::ClampToEdge,
                mag_filter: ::wgpu::FilterMode::Linear,
                min_filter: ::wgpu::FilterMode::Linear,
                ..Default::default()
            });
            let post_target =
                create_post_target(&device, &config, &post_layout, &post_sampler, &post_buffer);

            let scene_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("globe-scene-pipeline-layout"),
                bind_group_layouts: &[&globals_layout],
                immediate_size: 0,
            });
            let post_pipeline_layout =
                device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                    label: Some("globe-post-pipeline-layout"),
                    bind_group_layouts: &[&post_layout],
                    immediate_size: 0,
                });

            let globe_shader = shader(&device, "globe-shader", GLOBE_WGSL);
            let atmosphere_shader = shader(&device, "atmosphere-shader", ATMOSPHERE_WGSL);
            let marker_shader = shader(&device, "marker-shader", MARKER_WGSL);
            let arc_shader = shader(&device, "arc-shader", ARC_WGSL);
            let post_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
                label: Some("post-shader"),
                source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(POST_WGSL)),
            });

            let instance_layout = ::wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceRaw>() as ::wgpu::BufferAddress,
                step_mode: ::wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            };
            let arc_layouts = [
                ::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ArcVertexRaw>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &ARC_ATTRIBUTES,
                },
                ::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ArcColorRaw>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &ARC_COLOR_ATTRIBUTES,
                },
            ];

            let pipelines = Pipelines {
                globe: scene_pipeline(
                    &device,
                    format,
                    PipelineDesc {
                        label: "globe-pipeline",
                        module: &globe_shader,
                        layout: &scene_layout,
                        buffers: &[mesh_layout()],
                        blend: ::wgpu::BlendState::REPLACE,
                        depth_write: true,
                    },
                ),
                markers: scene_pipeline(
                    &device,
                    format,
                    PipelineDesc {
                        label: "marker-pipeline",
                        module: &marker_shader,
                        layout: &scene_layout,
                        buffers: &[mesh_layout(), instance_layout],
                        blend: ::wgpu::BlendState::ALPHA_BLENDING,
                        depth_write: true,
                    },
                ),
                atmosphere: scene_pipeline(
                    &device,
                    format,
                    PipelineDesc {
                        label: "atmosphere-pipeline",
                        module: &atmosphere_shader,
                        layout: &scene_layout,
                        buffers: &[mesh_layout()],
                        blend: ADDITIVE,
                        depth_write: false,
                    },
                ),
                arcs: scene_pipeline(
                    &device,
                    format,
                    PipelineDesc {
                        label: "arc-pipeline",
                        module: &arc_shader,
                        layout: &scene_layout,
                        buffers: &arc_layouts,
                        blend: ADDITIVE,
                        depth_write: false,
                    },
                ),
                post: device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
                    label: Some("post-pipeline"),
                    layout: Some(&post_pipeline_layout),
                    vertex: ::wgpu::VertexState {
                        module: &post_shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[],
                    },
                    fragment: Some(::wgpu::FragmentState {
                        module: &post_shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(::wgpu::ColorTargetState {
                            format,
                            blend: Some(::wgpu::BlendState::REPLACE),
                            write_mask: ::wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: ::wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: ::wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                }),
            };

            let globe = MeshBuffers::upload(&device, "globe-mesh", &mesh::globe_mesh());
            let atmosphere =
                MeshBuffers::upload(&device, "atmosphere-mesh", &mesh::atmosphere_mesh());
            let marker = MeshBuffers::upload(
                &device,
                "marker-mesh",
                &mesh::marker_mesh(marker_radius as f32),
            );

            info!(
                backend = ?adapter.get_info().backend,
                format = ?format,
                width = config.width,
                height = config.height,
                "wgpu context ready"
            );

            Ok(Self {
                canvas,
                surface,
                device,
                queue,
                config,
                depth_view,
                pipelines,
                globals_buffer,
                globals_bind_group,
                post_buffer,
                post_layout,
                post_sampler,
                post_target,
                globe,
                atmosphere,
                marker,
                instances: None,
                instance_capacity: 0,
                arcs: None,
                released: false,
            })
        }

        fn reconfigure(&mut self) {
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
            self.post_target = create_post_target(
                &self.device,
                &self.config,
                &self.post_layout,
                &self.post_sampler,
                &self.post_buffer,
            );
        }

        fn draw_scene(&self, pass: &mut ::wgpu::RenderPass<'_>, frame: &RenderFrame) {
            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            pass.set_pipeline(&self.pipelines.globe);
            pass.set_vertex_buffer(0, self.globe.vertices.slice(..));
            pass.set_index_buffer(self.globe.indices.slice(..), ::wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.globe.index_count, 0, 0..1);

            if let Some(instances) = self.instances.as_ref().filter(|_| frame.instance_count > 0)
            {
                pass.set_pipeline(&self.pipelines.markers);
                pass.set_vertex_buffer(0, self.marker.vertices.slice(..));
                pass.set_vertex_buffer(1, instances.slice(..));
                pass.set_index_buffer(self.marker.indices.slice(..), ::wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.marker.index_count, 0, 0..frame.instance_count);
            }

            pass.set_pipeline(&self.pipelines.atmosphere);
            pass.set_vertex_buffer(0, self.atmosphere.vertices.slice(..));
            pass.set_index_buffer(
                self.atmosphere.indices.slice(..),
                ::wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..self.atmosphere.index_count, 0, 0..1);

            if let Some(arcs) = self.arcs.as_ref().filter(|_| frame.arc_index_count > 0)
                && let Some(colors) = arcs.colors.as_ref()
            {
                pass.set_pipeline(&self.pipelines.arcs);
                pass.set_vertex_buffer(0, arcs.vertices.slice(..));
                pass.set_vertex_buffer(1, colors.slice(..));
                pass.set_index_buffer(arcs.indices.slice(..), ::wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..frame.arc_index_count, 0, 0..1);
            }
        }
    }

    impl RenderBackend for WgpuBackend {
        fn resize(&mut self, size: SurfaceSize) {
            if self.released {
                return;
            }
            let (width, height) = (size.width.max(1), size.height.max(1));
            if width == self.config.width && height == self.config.height {
                return;
            }
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.config.width = width;
            self.config.height = height;
            self.reconfigure();
            debug!(width, height, "surface resized");
        }

        fn upload_instances(&mut self, instances: &[InstanceRaw]) {
            if self.released || instances.is_empty() {
                return;
            }
            if instances.len() > self.instance_capacity || self.instances.is_none() {
                let capacity = instances.len().next_power_of_two();
                self.instances = Some(self.device.create_buffer(&::wgpu::BufferDescriptor {
                    label: Some("globe-instances"),
                    size: (capacity * std::mem::size_of::<InstanceRaw>()) as u64,
                    usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
                self.instance_capacity = capacity;
            }
            if let Some(buffer) = &self.instances {
                self.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(instances));
            }
        }

        fn upload_arc_geometry(&mut self, vertices: &[ArcVertexRaw], indices: &[u32]) {
            if self.released {
                return;
            }
            if vertices.is_empty() || indices.is_empty() {
                self.arcs = None;
                return;
            }
            self.arcs = Some(ArcBuffers {
                vertices: self
                    .device
                    .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("globe-arc-vertices"),
                        contents: bytemuck::cast_slice(vertices),
                        usage: ::wgpu::BufferUsages::VERTEX,
                    }),
                indices: self
                    .device
                    .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some("globe-arc-indices"),
                        contents: bytemuck::cast_slice(indices),
                        usage: ::wgpu::BufferUsages::INDEX,
                    }),
                colors: None,
                vertex_count: vertices.len(),
            });
        }

        fn upload_arc_colors(&mut self, colors: &[ArcColorRaw]) {
            if self.released {
                return;
            }
            let Some(arcs) = self.arcs.as_mut() else {
                return;
            };
            // A color buffer shorter than the geometry would read out of bounds.
            if colors.len() != arcs.vertex_count {
                arcs.colors = None;
                return;
            }
            match &arcs.colors {
                Some(buffer) => self
                    .queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(colors)),
                None => {
                    arcs.colors = Some(self.device.create_buffer_init(
                        &::wgpu::util::BufferInitDescriptor {
                            label: Some("globe-arc-colors"),
                            contents: bytemuck::cast_slice(colors),
                            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                        },
                    ));
                }
            }
        }

        fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
            if self.released {
                return Err(RenderError::Backend("backend released".into()));
            }
            let output = match self.surface.get_current_texture() {
                Ok(output) => output,
                Err(::wgpu::SurfaceError::Lost | ::wgpu::SurfaceError::Outdated) => {
                    self.reconfigure();
                    return Err(RenderError::SurfaceLost);
                }
                Err(e) => return Err(RenderError::Backend(format!("surface acquire failed: {e}"))),
            };
            let surface_view = output
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());

            self.queue
                .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&frame.globals));
            if frame.post_enabled {
                self.queue
                    .write_buffer(&self.post_buffer, 0, bytemuck::bytes_of(&frame.post));
            }

            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("globe-frame-encoder"),
                });

            let [r, g, b, a] = frame.clear_color;
            let scene_view = if frame.post_enabled {
                &self.post_target.view
            } else {
                &surface_view
            };
            {
                let mut pass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("globe-scene-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: scene_view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color { r, g, b, a }),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(1.0),
                            store: ::wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                self.draw_scene(&mut pass, frame);
            }

            if frame.post_enabled {
                let mut pass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("globe-post-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: &surface_view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color::BLACK),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                pass.set_pipeline(&self.pipelines.post);
                pass.set_bind_group(0, &self.post_target.bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }

        fn release(&mut self) {
            if self.released {
                return;
            }
            self.released = true;
            self.instances = None;
            self.instance_capacity = 0;
            self.arcs = None;
            self.globe.vertices.destroy();
            self.globe.indices.destroy();
            self.atmosphere.vertices.destroy();
            self.atmosphere.indices.destroy();
            self.marker.vertices.destroy();
            self.marker.indices.destroy();
            self.globals_buffer.destroy();
            self.post_buffer.destroy();
            info!("wgpu resources released");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::raw::{ArcColorRaw, ArcVertexRaw, InstanceRaw};
    use gpu::{RenderBackend, RenderError, RenderFrame, RenderSurface, SurfaceSize};

    /// Native builds have no canvas; acquiring always fails.
    pub struct CanvasSurface {
        css_width: f64,
        css_height: f64,
        device_pixel_ratio: f64,
    }

    impl CanvasSurface {
        pub async fn attach(
            canvas: web_sys::HtmlCanvasElement,
            device_pixel_ratio: f64,
            _marker_radius: f64,
        ) -> Self {
            Self {
                css_width: f64::from(canvas.client_width()),
                css_height: f64::from(canvas.client_height()),
                device_pixel_ratio,
            }
        }
    }

    impl RenderSurface for CanvasSurface {
        type Backend = WgpuBackend;

        fn css_size(&self) -> (f64, f64) {
            (self.css_width, self.css_height)
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.device_pixel_ratio
        }

        fn acquire_backend(self) -> Result<WgpuBackend, RenderError> {
            Err(RenderError::ContextUnavailable(
                "wgpu rendering is only available on wasm32 targets".into(),
            ))
        }
    }

    #[derive(Debug, Default)]
    pub struct WgpuBackend;

    impl RenderBackend for WgpuBackend {
        fn resize(&mut self, _size: SurfaceSize) {}

        fn upload_instances(&mut self, _instances: &[InstanceRaw]) {}

        fn upload_arc_geometry(&mut self, _vertices: &[ArcVertexRaw], _indices: &[u32]) {}

        fn upload_arc_colors(&mut self, _colors: &[ArcColorRaw]) {}

        fn render(&mut self, _frame: &RenderFrame) -> Result<(), RenderError> {
            Err(RenderError::ContextUnavailable(
                "wgpu rendering is only available on wasm32 targets".into(),
            ))
        }

        fn release(&mut self) {}
    }
}

pub use imp::{CanvasSurface, WgpuBackend};
