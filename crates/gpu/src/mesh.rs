use crate::raw::MeshVertexRaw;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertexRaw>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// UV sphere of `radius` with outward normals.
pub fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let lat_segments = height_segments.max(3);
    let lon_segments = width_segments.max(3);

    let mut vertices = Vec::with_capacity(((lat_segments + 1) * (lon_segments + 1)) as usize);
    for lat in 0..=lat_segments {
        let v = lat as f32 / lat_segments as f32;
        let theta = v * std::f32::consts::PI;
        let sin_t = theta.sin();
        let cos_t = theta.cos();

        for lon in 0..=lon_segments {
            let u = lon as f32 / lon_segments as f32;
            let phi = u * std::f32::consts::TAU;
            let normal = [sin_t * phi.cos(), cos_t, sin_t * phi.sin()];
            vertices.push(MeshVertexRaw {
                position: normal.map(|c| c * radius),
                normal,
            });
        }
    }

    let stride = lon_segments + 1;
    let mut indices = Vec::with_capacity((lat_segments * lon_segments * 6) as usize);
    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let i0 = lat * stride + lon;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    MeshData { vertices, indices }
}

/// Globe body (radius 1).
pub fn globe_mesh() -> MeshData {
    sphere_mesh(1.0, 96, 96)
}

/// Atmosphere shell; the shader scales it further.
pub fn atmosphere_mesh() -> MeshData {
    sphere_mesh(1.02, 64, 64)
}

/// Unscaled incident marker.
pub fn marker_mesh(radius: f32) -> MeshData {
    sphere_mesh(radius, 8, 8)
}

#[cfg(test)]
mod tests {
    use super::{marker_mesh, sphere_mesh};

    #[test]
    fn sphere_vertices_sit_on_radius() {
        let mesh = sphere_mesh(2.0, 16, 8);
        assert_eq!(mesh.vertices.len(), 17 * 9);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        let mesh = marker_mesh(0.01);
        assert_eq!(mesh.index_count(), 8 * 8 * 6);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn segments_are_clamped() {
        let mesh = sphere_mesh(1.0, 0, 1);
        assert_eq!(mesh.vertices.len(), 4 * 4);
    }
}
