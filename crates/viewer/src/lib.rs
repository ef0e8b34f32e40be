//! Scene and interaction engine for the incident globe.

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;

pub use config::EngineConfig;
pub use engine::{EngineOptions, GlobeEngine, IncidentCallback};
pub use error::EngineError;
pub use input::{Key, PointerEvent, Viewport, WheelEvent};
