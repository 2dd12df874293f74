pub mod error;
pub mod event;
pub mod geo;

pub use error::*;
pub use event::*;
pub use geo::*;
