pub mod entity;
pub mod events;

pub use entity::*;
pub use events::*;
