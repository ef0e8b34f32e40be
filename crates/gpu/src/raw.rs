//! Plain-old-data layouts shared with the WGSL shaders.
//!
//! Every struct is `#[repr(C)]` and padded to 16-byte rows so it can be
//! copied into uniform or vertex buffers byte-for-byte.

use bytemuck::{Pod, Zeroable};

/// Position + normal for static meshes (globe, atmosphere, marker sphere).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertexRaw {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Per-instance marker data: model matrix columns and linear RGBA color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Tube vertex. `progress` runs 0..1 along the ribbon.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ArcVertexRaw {
    pub position: [f32; 3],
    pub progress: f32,
    pub normal: [f32; 3],
    pub dash_phase: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ArcColorRaw {
    pub color: [f32; 4],
}

/// Per-frame scene uniforms.
///
/// The `w` lane of several rows carries a scalar to keep the layout flat.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GlobalsRaw {
    pub view_proj: [[f32; 4]; 4],
    /// Whole-scene rotation applied to globe, markers and ribbons.
    pub scene: [[f32; 4]; 4],
    /// xyz camera position, w elapsed seconds.
    pub camera_time: [f32; 4],
    /// rgb fog color, w density.
    pub fog: [f32; 4],
    /// rgb globe base color, w surface detail.
    pub globe: [f32; 4],
    /// rgb fresnel rim color, w seconds since ribbons were built.
    pub fresnel_arc_time: [f32; 4],
    /// rgb glow color, w shell scale.
    pub atmosphere: [f32; 4],
    /// rgb ambient color, w intensity.
    pub ambient: [f32; 4],
    /// rgb key light color, w intensity.
    pub key_light: [f32; 4],
    /// xyz key light direction, w unused.
    pub key_dir: [f32; 4],
}

/// Post-processing uniforms.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostRaw {
    /// x intensity, y luminance threshold.
    pub bloom: [f32; 4],
    /// x darkness, y offset, z FXAA on (1) / off (0).
    pub vignette_fxaa: [f32; 4],
    /// xy chromatic offset, zw texel size.
    pub chroma_texel: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::{ArcColorRaw, ArcVertexRaw, GlobalsRaw, InstanceRaw, MeshVertexRaw, PostRaw};
    use std::mem::size_of;

    #[test]
    fn layouts_match_shader_strides() {
        assert_eq!(size_of::<MeshVertexRaw>(), 24);
        assert_eq!(size_of::<InstanceRaw>(), 80);
        assert_eq!(size_of::<ArcVertexRaw>(), 32);
        assert_eq!(size_of::<ArcColorRaw>(), 16);
        assert_eq!(size_of::<GlobalsRaw>(), 64 * 2 + 16 * 8);
        assert_eq!(size_of::<PostRaw>(), 48);
    }

    #[test]
    fn casts_to_bytes() {
        let inst = InstanceRaw {
            model: [[1.0, 0.0, 0.0, 0.0]; 4],
            color: [1.0, 0.5, 0.25, 1.0],
        };
        let bytes: &[u8] = bytemuck::bytes_of(&inst);
        assert_eq!(bytes.len(), 80);
    }
}
