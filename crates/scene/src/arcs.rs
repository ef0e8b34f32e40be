use std::f64::consts::TAU;

use foundation::math::{Quat, Vec3, to_surface_point};
use layers::Connection;
use layers::symbology::{self, Color};

/// Cubic Bézier segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
}

impl CubicBezier {
    /// Arc between two surface points bulging away from the globe center:
    /// both inner control points sit at `mid + bulge * normalize(mid)`.
    pub fn bulged(from: Vec3, to: Vec3, bulge: f64) -> Self {
        let mid = (from + to) * 0.5;
        let control = mid + mid.normalize_or_zero() * bulge;
        Self {
            p0: from,
            p1: control,
            p2: control,
            p3: to,
        }
    }

    pub fn point(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    pub fn derivative(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }
}

/// Ribbon geometry and sizing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcStyle {
    /// Radius at which endpoints are placed.
    pub surface_radius: f64,
    pub bulge: f64,
    pub base_radius: f64,
    /// Extra tube radius per unit of connection intensity.
    pub intensity_radius: f64,
    pub tubular_segments: u32,
    pub radial_segments: u32,
}

impl Default for ArcStyle {
    fn default() -> Self {
        Self {
            surface_radius: 1.02,
            bulge: 0.25,
            base_radius: 0.0025,
            intensity_radius: 0.002,
            tubular_segments: 32,
            radial_segments: 8,
        }
    }
}

/// One connection ribbon, tagged with the ids it links.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionArc {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub curve: CubicBezier,
    pub radius: f64,
    pub color: Color,
    /// Dash offset in `[0, 2π)`, stable per connection id.
    pub dash_phase: f64,
}

impl ConnectionArc {
    pub fn new(connection: &Connection, style: &ArcStyle) -> Self {
        let from = to_surface_point(connection.from.lat, connection.from.lng, style.surface_radius);
        let to = to_surface_point(connection.to.lat, connection.to.lng, style.surface_radius);
        Self {
            id: connection.id.clone(),
            from_id: connection.from.id.clone(),
            to_id: connection.to.id.clone(),
            curve: CubicBezier::bulged(from, to, style.bulge),
            radius: style.base_radius + connection.intensity * style.intensity_radius,
            color: symbology::CONNECTION,
            dash_phase: dash_phase(&connection.id),
        }
    }

    pub fn touches(&self, incident_id: &str) -> bool {
        self.from_id == incident_id || self.to_id == incident_id
    }
}

/// Deterministic dash phase derived from the connection id.
pub fn dash_phase(id: &str) -> f64 {
    let hash = blake3::hash(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    let unit = (u64::from_le_bytes(head) >> 11) as f64 / (1u64 << 53) as f64;
    unit * TAU
}

/// The live set of connection ribbons.
///
/// Ribbons are always rebuilt together, so they share one clock that
/// restarts at zero on every rebuild.
#[derive(Debug, Clone, Default)]
pub struct ArcSet {
    arcs: Vec<ConnectionArc>,
    time_s: f64,
    geometry_version: u64,
    styles_dirty: bool,
}

impl ArcSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every ribbon and builds one per connection, all in base color.
    pub fn rebuild(&mut self, connections: &[Connection], style: &ArcStyle) {
        self.arcs = connections
            .iter()
            .map(|c| ConnectionArc::new(c, style))
            .collect();
        self.time_s = 0.0;
        self.geometry_version += 1;
        self.styles_dirty = true;
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionArc> + '_ {
        self.arcs.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ConnectionArc> {
        self.arcs.iter().find(|a| a.id == id)
    }

    /// Colors every ribbon touching `incident_id` as related and the rest as
    /// base. Returns how many ribbons changed color.
    pub fn highlight_for(&mut self, incident_id: Option<&str>) -> usize {
        let mut changed = 0;
        for arc in &mut self.arcs {
            let related = incident_id.is_some_and(|id| arc.touches(id));
            let color = if related {
                symbology::CONNECTION_RELATED
            } else {
                symbology::CONNECTION
            };
            if arc.color != color {
                arc.color = color;
                changed += 1;
            }
        }
        if changed > 0 {
            self.styles_dirty = true;
        }
        changed
    }

    /// Advances the ribbon clock that drives the dash animation.
    pub fn advance(&mut self, dt_s: f64) {
        self.time_s += dt_s;
    }

    /// Seconds since the last rebuild.
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Bumped by every rebuild.
    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    pub fn take_styles_dirty(&mut self) -> bool {
        std::mem::take(&mut self.styles_dirty)
    }
}

/// Triangle mesh for one tube. `uvs[i].x` runs along the curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

fn clamp_segments(tubular: u32, radial: u32) -> (u32, u32) {
    (tubular.max(1), radial.max(3))
}

/// Vertices [`tube_mesh`] emits for the given segment counts.
pub fn tube_vertex_count(tubular: u32, radial: u32) -> usize {
    let (tubular, radial) = clamp_segments(tubular, radial);
    ((tubular + 1) * (radial + 1)) as usize
}

/// Sweeps a circle of `radius` along `curve` using parallel-transport frames.
///
/// Produces `(tubular + 1) * (radial + 1)` vertices and
/// `tubular * radial * 6` indices.
pub fn tube_mesh(curve: &CubicBezier, radius: f64, tubular: u32, radial: u32) -> TubeMesh {
    let (tubular, radial) = clamp_segments(tubular, radial);
    let frames = transport_frames(curve, tubular);

    let ring = (radial + 1) as usize;
    let mut mesh = TubeMesh {
        positions: Vec::with_capacity(frames.len() * ring),
        normals: Vec::with_capacity(frames.len() * ring),
        uvs: Vec::with_capacity(frames.len() * ring),
        indices: Vec::with_capacity((tubular * radial * 6) as usize),
    };

    for (i, frame) in frames.iter().enumerate() {
        let u = i as f64 / f64::from(tubular);
        for j in 0..=radial {
            let v = f64::from(j) / f64::from(radial) * TAU;
            let normal = (frame.normal * -v.cos() + frame.binormal * v.sin()).normalize_or_zero();
            mesh.positions.push((frame.point + normal * radius).to_f32());
            mesh.normals.push(normal.to_f32());
            mesh.uvs.push([u as f32, (f64::from(j) / f64::from(radial)) as f32]);
        }
    }

    let ring = radial + 1;
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = ring * (j - 1) + (i - 1);
            let b = ring * j + (i - 1);
            let c = ring * j + i;
            let d = ring * (j - 1) + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

#[derive(Debug, Copy, Clone)]
struct Frame {
    point: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

fn transport_frames(curve: &CubicBezier, segments: u32) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(segments as usize + 1);
    let mut prev_tangent: Option<Vec3> = None;
    let mut normal = Vec3::ZERO;

    for i in 0..=segments {
        let t = f64::from(i) / f64::from(segments);
        let tangent = curve
            .derivative(t)
            .try_normalize()
            .or(prev_tangent)
            .unwrap_or(Vec3::X);

        normal = match prev_tangent {
            None => initial_normal(tangent),
            Some(prev) => Quat::from_unit_vectors(prev, tangent).rotate(normal),
        };
        let binormal = tangent.cross(normal).normalize_or_zero();
        frames.push(Frame {
            point: curve.point(t),
            normal,
            binormal,
        });
        prev_tangent = Some(tangent);
    }
    frames
}

/// Normal perpendicular to `tangent`, seeded from its smallest component axis.
fn initial_normal(tangent: Vec3) -> Vec3 {
    let (ax, ay, az) = (tangent.x.abs(), tangent.y.abs(), tangent.z.abs());
    let axis = if ax <= ay && ax <= az {
        Vec3::X
    } else if ay <= az {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let side = tangent.cross(axis).normalize_or_zero();
    tangent.cross(side).normalize_or_zero()
}
