use crate::raw::{ArcColorRaw, ArcVertexRaw, InstanceRaw};
use crate::renderer::RenderFrame;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Physical size for a CSS-pixel size at `pixel_ratio`, never below 1x1.
    pub fn from_css(css_width: f64, css_height: f64, pixel_ratio: f64) -> Self {
        let px = |v: f64| {
            let scaled = (v * pixel_ratio).round();
            if scaled.is_finite() && scaled >= 1.0 {
                scaled.min(f64::from(u32::MAX)) as u32
            } else {
                1
            }
        };
        Self::new(px(css_width), px(css_height))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The rendering context could not be created at all.
    ContextUnavailable(String),
    /// The swapchain texture was lost or outdated; the next frame reconfigures.
    SurfaceLost,
    Backend(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::ContextUnavailable(msg) => {
                write!(f, "rendering context unavailable: {msg}")
            }
            RenderError::SurfaceLost => write!(f, "render surface lost"),
            RenderError::Backend(msg) => write!(f, "render backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Something the engine can be attached to: a canvas, a window, or a test
/// double. Acquiring the backend consumes the surface.
pub trait RenderSurface {
    type Backend: RenderBackend;

    /// Layout size in CSS pixels; pointer coordinates use the same units.
    fn css_size(&self) -> (f64, f64);

    fn device_pixel_ratio(&self) -> f64;

    fn acquire_backend(self) -> Result<Self::Backend, RenderError>;
}

/// GPU-side resources for one globe scene.
///
/// Uploads replace the previous contents wholesale. `render` draws one frame
/// with whatever was last uploaded.
pub trait RenderBackend {
    fn resize(&mut self, size: SurfaceSize);

    fn upload_instances(&mut self, instances: &[InstanceRaw]);

    fn upload_arc_geometry(&mut self, vertices: &[ArcVertexRaw], indices: &[u32]);

    /// One color per arc vertex, parallel to the last geometry upload.
    fn upload_arc_colors(&mut self, colors: &[ArcColorRaw]);

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError>;

    /// Frees every GPU resource. No other call is valid afterwards.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::{RenderError, SurfaceSize};

    #[test]
    fn css_size_scales_and_clamps() {
        assert_eq!(SurfaceSize::from_css(800.0, 600.0, 1.5), SurfaceSize::new(1200, 900));
        assert_eq!(SurfaceSize::from_css(0.0, 600.0, 2.0), SurfaceSize::new(1, 1200));
        assert_eq!(SurfaceSize::from_css(f64::NAN, -3.0, 1.0), SurfaceSize::new(1, 1));
    }

    #[test]
    fn errors_render_readably() {
        let e = RenderError::ContextUnavailable("no adapter".into());
        assert_eq!(e.to_string(), "rendering context unavailable: no adapter");
        assert_eq!(RenderError::SurfaceLost.to_string(), "render surface lost");
    }
}
