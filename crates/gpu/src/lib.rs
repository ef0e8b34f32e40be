pub mod backend;
pub mod headless;
pub mod mesh;
pub mod raw;
pub mod renderer;

pub use backend::{RenderBackend, RenderError, RenderSurface, SurfaceSize};
pub use headless::{HeadlessBackend, HeadlessSurface};
pub use renderer::{ArcGeometry, FrameInputs, RenderFrame, Renderer};
