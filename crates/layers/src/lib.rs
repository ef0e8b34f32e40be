pub mod cluster;
pub mod connection;
pub mod incident;
pub mod symbology;

pub use cluster::*;
pub use connection::*;
pub use incident::*;
