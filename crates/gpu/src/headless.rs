//! In-memory backend that records what the engine uploads and draws.
//!
//! Used by native builds and tests where no GPU context exists.

use crate::backend::{RenderBackend, RenderError, RenderSurface, SurfaceSize};
use crate::raw::{ArcColorRaw, ArcVertexRaw, InstanceRaw};
use crate::renderer::RenderFrame;

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
    /// When false, acquiring a backend fails like a missing WebGL context.
    pub available: bool,
}

impl HeadlessSurface {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0.0, 0.0, 1.0)
        }
    }
}

impl RenderSurface for HeadlessSurface {
    type Backend = HeadlessBackend;

    fn css_size(&self) -> (f64, f64) {
        (self.css_width, self.css_height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn acquire_backend(self) -> Result<HeadlessBackend, RenderError> {
        if !self.available {
            return Err(RenderError::ContextUnavailable(
                "headless surface disabled".to_string(),
            ));
        }
        Ok(HeadlessBackend::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    pub size: SurfaceSize,
    pub instances: Vec<InstanceRaw>,
    pub instance_uploads: u64,
    pub arc_vertices: Vec<ArcVertexRaw>,
    pub arc_indices: Vec<u32>,
    pub arc_geometry_uploads: u64,
    pub arc_colors: Vec<ArcColorRaw>,
    pub arc_color_uploads: u64,
    pub last_frame: Option<RenderFrame>,
    pub frames_rendered: u64,
    /// Number of upcoming `render` calls that fail with a backend error.
    pub fail_renders: u32,
    pub released: bool,
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn upload_instances(&mut self, instances: &[InstanceRaw]) {
        self.instances = instances.to_vec();
        self.instance_uploads += 1;
    }

    fn upload_arc_geometry(&mut self, vertices: &[ArcVertexRaw], indices: &[u32]) {
        self.arc_vertices = vertices.to_vec();
        self.arc_indices = indices.to_vec();
        self.arc_geometry_uploads += 1;
    }

    fn upload_arc_colors(&mut self, colors: &[ArcColorRaw]) {
        self.arc_colors = colors.to_vec();
        self.arc_color_uploads += 1;
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Backend("backend already released".to_string()));
        }
        if self.fail_renders > 0 {
            self.fail_renders -= 1;
            return Err(RenderError::Backend("injected failure".to_string()));
        }
        self.last_frame = Some(*frame);
        self.frames_rendered += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.instances.clear();
        self.arc_vertices.clear();
        self.arc_indices.clear();
        self.arc_colors.clear();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessBackend, HeadlessSurface};
    use crate::backend::{RenderBackend, RenderError, RenderSurface};
    use crate::renderer::RenderFrame;
    use bytemuck::Zeroable;

    fn blank_frame() -> RenderFrame {
        RenderFrame {
            globals: Zeroable::zeroed(),
            post: Zeroable::zeroed(),
            post_enabled: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            instance_count: 0,
            arc_index_count: 0,
        }
    }

    #[test]
    fn unavailable_surface_fails_to_acquire() {
        let err = HeadlessSurface::unavailable().acquire_backend().unwrap_err();
        assert!(matches!(err, RenderError::ContextUnavailable(_)));
    }

    #[test]
    fn injected_failures_are_consumed() {
        let mut backend = HeadlessSurface::new(10.0, 10.0, 1.0)
            .acquire_backend()
            .unwrap();
        backend.fail_renders = 1;
        let frame = blank_frame();
        assert!(backend.render(&frame).is_err());
        assert!(backend.render(&frame).is_ok());
        assert_eq!(backend.frames_rendered, 1);
    }

    #[test]
    fn release_clears_uploads_and_blocks_rendering() {
        let mut backend = HeadlessBackend::default();
        backend.upload_arc_geometry(&[], &[0, 1, 2]);
        backend.release();
        assert!(backend.arc_indices.is_empty());
        let frame = blank_frame();
        assert!(backend.render(&frame).is_err());
    }
}
