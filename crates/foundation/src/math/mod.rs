pub mod mat;
pub mod precision;
pub mod projection;
pub mod quat;
pub mod vec;

pub use mat::*;
pub use precision::*;
pub use projection::*;
pub use quat::*;
pub use vec::*;
