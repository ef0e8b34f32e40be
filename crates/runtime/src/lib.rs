pub mod easing;
pub mod frame;
pub mod tween;

pub use easing::*;
pub use frame::*;
pub use tween::*;
