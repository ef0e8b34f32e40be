//! GPU-agnostic scene state for the incident globe.

pub mod arcs;
pub mod camera;
pub mod dressing;
pub mod instances;
pub mod picking;
pub mod post;
pub mod spatial;
pub mod transform;

pub use arcs::{ArcSet, ArcStyle, ConnectionArc, CubicBezier, TubeMesh, tube_mesh, tube_vertex_count};
pub use camera::PerspectiveCamera;
pub use dressing::SceneDressing;
pub use instances::{Instance, InstanceBuffer, InstanceDirty, MarkerStyle};
pub use picking::{InstancePicker, PickHit, PickOptions, Ray};
pub use post::{PostChain, Quality, RenderSettings};
pub use transform::{InstanceTransform, SceneRotation};
