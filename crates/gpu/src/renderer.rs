use scene::arcs::{ArcSet, ArcStyle, tube_mesh, tube_vertex_count};
use scene::dressing::{ATMOSPHERE_SCALE, SceneDressing};
use scene::{InstanceBuffer, PerspectiveCamera, RenderSettings, SceneRotation};

use crate::backend::SurfaceSize;
use crate::raw::{ArcColorRaw, ArcVertexRaw, GlobalsRaw, InstanceRaw, PostRaw};

/// Everything the backend needs to draw one frame, besides uploaded buffers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderFrame {
    pub globals: GlobalsRaw,
    pub post: PostRaw,
    /// When false the scene is drawn straight to the surface.
    pub post_enabled: bool,
    /// Linear RGBA.
    pub clear_color: [f64; 4],
    pub instance_count: u32,
    pub arc_index_count: u32,
}

/// Per-frame scene state handed to [`Renderer::collect`].
#[derive(Debug, Copy, Clone)]
pub struct FrameInputs<'a> {
    pub camera: &'a PerspectiveCamera,
    pub rotation: SceneRotation,
    pub dressing: &'a SceneDressing,
    pub settings: &'a RenderSettings,
    pub surface: SurfaceSize,
    pub elapsed_s: f64,
    pub detail: f64,
    pub arc_time_s: f64,
    pub instance_count: usize,
    pub arc_index_count: usize,
}

/// Tube geometry for every ribbon, concatenated in ribbon order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArcGeometry {
    pub vertices: Vec<ArcVertexRaw>,
    pub indices: Vec<u32>,
}

pub struct Renderer;

impl Renderer {
    pub fn collect(inputs: &FrameInputs<'_>) -> RenderFrame {
        let d = inputs.dressing;
        let post = inputs.settings.post();
        let rgb_w = |c: [f32; 3], w: f64| [c[0], c[1], c[2], w as f32];
        let pos = inputs.camera.position.to_f32();
        let key = d.key_direction().to_f32();
        let clear = d.clear_color.to_linear_f32();

        RenderFrame {
            globals: GlobalsRaw {
                view_proj: inputs.camera.view_projection().to_f32(),
                scene: inputs.rotation.matrix().to_f32(),
                camera_time: [pos[0], pos[1], pos[2], inputs.elapsed_s as f32],
                fog: rgb_w(d.fog_color.to_linear_f32(), d.fog_density),
                globe: rgb_w(d.globe_base.to_linear_f32(), inputs.detail),
                fresnel_arc_time: rgb_w(d.fresnel.to_linear_f32(), inputs.arc_time_s),
                atmosphere: rgb_w(d.atmosphere.to_linear_f32(), ATMOSPHERE_SCALE),
                ambient: rgb_w(d.ambient.to_linear_f32(), d.ambient_intensity),
                key_light: rgb_w(d.key_light.to_linear_f32(), d.key_intensity),
                key_dir: [key[0], key[1], key[2], 0.0],
            },
            post: PostRaw {
                bloom: [
                    post.bloom_intensity as f32,
                    post.bloom_threshold as f32,
                    0.0,
                    0.0,
                ],
                vignette_fxaa: [
                    post.vignette_darkness as f32,
                    post.vignette_offset as f32,
                    if post.fxaa { 1.0 } else { 0.0 },
                    0.0,
                ],
                chroma_texel: [
                    post.chromatic_offset[0] as f32,
                    post.chromatic_offset[1] as f32,
                    1.0 / inputs.surface.width.max(1) as f32,
                    1.0 / inputs.surface.height.max(1) as f32,
                ],
            },
            post_enabled: post.enabled,
            clear_color: [
                f64::from(clear[0]),
                f64::from(clear[1]),
                f64::from(clear[2]),
                1.0,
            ],
            instance_count: inputs.instance_count as u32,
            arc_index_count: inputs.arc_index_count as u32,
        }
    }

    pub fn pack_instances(instances: &InstanceBuffer) -> Vec<InstanceRaw> {
        instances
            .iter()
            .map(|inst| InstanceRaw {
                model: inst.transform.matrix().to_f32(),
                color: inst.color.to_linear_rgba(1.0),
            })
            .collect()
    }

    pub fn pack_arc_geometry(arcs: &ArcSet, style: &ArcStyle) -> ArcGeometry {
        let mut out = ArcGeometry::default();
        for arc in arcs.iter() {
            let mesh = tube_mesh(
                &arc.curve,
                arc.radius,
                style.tubular_segments,
                style.radial_segments,
            );
            let base = out.vertices.len() as u32;
            out.vertices.extend(
                mesh.positions
                    .iter()
                    .zip(&mesh.normals)
                    .zip(&mesh.uvs)
                    .map(|((position, normal), uv)| ArcVertexRaw {
                        position: *position,
                        progress: uv[0],
                        normal: *normal,
                        dash_phase: arc.dash_phase as f32,
                    }),
            );
            out.indices.extend(mesh.indices.iter().map(|i| base + i));
        }
        out
    }

    /// One color per vertex of [`Renderer::pack_arc_geometry`].
    pub fn pack_arc_colors(arcs: &ArcSet, style: &ArcStyle) -> Vec<ArcColorRaw> {
        let per_arc = tube_vertex_count(style.tubular_segments, style.radial_segments);
        let mut out = Vec::with_capacity(per_arc * arcs.len());
        for arc in arcs.iter() {
            let color = ArcColorRaw {
                color: arc.color.to_linear_rgba(1.0),
            };
            out.extend(std::iter::repeat_n(color, per_arc));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameInputs, Renderer};
    use crate::backend::SurfaceSize;
    use foundation::math::Vec3;
    use layers::symbology::{CONNECTION, CONNECTION_RELATED, INCIDENT};
    use layers::{Incident, derive_connections};
    use scene::arcs::{ArcSet, ArcStyle};
    use scene::dressing::SceneDressing;
    use scene::{InstanceBuffer, MarkerStyle, PerspectiveCamera, RenderSettings, SceneRotation};

    fn incidents() -> Vec<Incident> {
        vec![
            Incident::new("a", 10.0, 20.0, 2, ""),
            Incident::new("b", -5.0, -100.0, 5, ""),
            Incident::new("c", 45.0, 60.0, 1, ""),
            Incident::new("d", 10.1, 20.1, 3, ""),
        ]
    }

    #[test]
    fn collect_reflects_post_toggle_and_counts() {
        let camera = PerspectiveCamera::new(Vec3::new(0.0, 1.5, 3.4), 32.0, 0.1, 200.0);
        let dressing = SceneDressing::default();
        let mut settings = RenderSettings::new(1.0, false);
        let inputs = FrameInputs {
            camera: &camera,
            rotation: SceneRotation::default(),
            dressing: &dressing,
            settings: &settings,
            surface: SurfaceSize::new(800, 600),
            elapsed_s: 1.5,
            detail: 2.5,
            arc_time_s: 0.25,
            instance_count: 4,
            arc_index_count: 96,
        };
        let frame = Renderer::collect(&inputs);
        assert!(frame.post_enabled);
        assert_eq!(frame.instance_count, 4);
        assert_eq!(frame.arc_index_count, 96);
        assert_eq!(frame.globals.camera_time[3], 1.5);
        assert_eq!(frame.globals.globe[3], 2.5);
        assert_eq!(frame.globals.fresnel_arc_time[3], 0.25);
        assert_eq!(frame.post.bloom[0], 1.2);
        assert_eq!(frame.post.chroma_texel[2], 1.0 / 800.0);

        let mut settings = settings;
        settings.set_reduce_motion(true);
        let frame = Renderer::collect(&FrameInputs {
            settings: &settings,
            ..inputs
        });
        assert!(!frame.post_enabled);
        assert_eq!(frame.post.bloom[0], 0.3);
        assert_eq!(frame.post.chroma_texel[0], 0.0);
    }

    /// Same falloff as the post shader's vignette.
    fn vignette(uv: [f32; 2], darkness: f32, offset: f32) -> f32 {
        let d = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt() * (darkness + offset);
        let (lo, hi) = (offset * 0.799, 0.8);
        let t = ((d - lo) / (hi - lo)).clamp(0.0, 1.0);
        1.0 - t * t * (3.0 - 2.0 * t)
    }

    #[test]
    fn vignette_parameters_darken_corners() {
        let camera = PerspectiveCamera::new(Vec3::new(0.0, 1.5, 3.4), 32.0, 0.1, 200.0);
        let dressing = SceneDressing::default();
        let settings = RenderSettings::new(1.0, false);
        let frame = Renderer::collect(&FrameInputs {
            camera: &camera,
            rotation: SceneRotation::default(),
            dressing: &dressing,
            settings: &settings,
            surface: SurfaceSize::new(640, 480),
            elapsed_s: 0.0,
            detail: 0.0,
            arc_time_s: 0.0,
            instance_count: 0,
            arc_index_count: 0,
        });
        let [darkness, offset, fxaa, _] = frame.post.vignette_fxaa;
        assert_eq!((darkness, offset), (0.6, 0.25));
        assert_eq!(fxaa, 1.0);

        assert_eq!(vignette([0.5, 0.5], darkness, offset), 1.0);
        let corner = vignette([0.0, 0.0], darkness, offset);
        let edge = vignette([0.0, 0.5], darkness, offset);
        assert!(corner < edge && edge < 1.0, "corner {corner}, edge {edge}");
        assert!(corner > 0.0);
    }

    #[test]
    fn instances_pack_matrix_and_color() {
        let mut buf = InstanceBuffer::new();
        buf.rebuild(&incidents(), &MarkerStyle::default());
        let raw = Renderer::pack_instances(&buf);
        assert_eq!(raw.len(), 4);
        assert_eq!(raw[0].color, INCIDENT.to_linear_rgba(1.0));
        let t = buf.get(1).unwrap().transform.position.to_f32();
        assert_eq!(&raw[1].model[3][..3], &t[..]);
        assert_eq!(raw[1].model[3][3], 1.0);
    }

    #[test]
    fn arc_geometry_and_colors_line_up() {
        let style = ArcStyle::default();
        let mut arcs = ArcSet::new();
        arcs.rebuild(&derive_connections(&incidents()), &style);
        arcs.highlight_for(Some("c"));

        let geo = Renderer::pack_arc_geometry(&arcs, &style);
        let colors = Renderer::pack_arc_colors(&arcs, &style);
        assert_eq!(geo.vertices.len(), 4 * 33 * 9);
        assert_eq!(colors.len(), geo.vertices.len());
        assert_eq!(geo.indices.len(), 4 * 32 * 8 * 6);
        let n = geo.vertices.len() as u32;
        assert!(geo.indices.iter().all(|&i| i < n));

        // Ribbon order: a-d, b-a, c-b, d-c; "c" touches the last two.
        let per_arc = 33 * 9;
        assert_eq!(colors[0].color, CONNECTION.to_linear_rgba(1.0));
        assert_eq!(colors[2 * per_arc].color, CONNECTION_RELATED.to_linear_rgba(1.0));
        assert_eq!(colors[3 * per_arc].color, CONNECTION_RELATED.to_linear_rgba(1.0));
        assert_eq!(geo.vertices[per_arc].dash_phase, arcs.iter().nth(1).unwrap().dash_phase as f32);
    }
}
