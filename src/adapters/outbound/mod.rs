pub mod buffered_logger;
pub mod console_logger;
pub mod file_logger;
pub mod in_memory_places;
pub mod in_memory_transport;
pub mod noop_logger;
pub mod recording_map_surface;

pub use buffered_logger::*;
pub use console_logger::*;
pub use file_logger::*;
pub use in_memory_places::*;
pub use in_memory_transport::*;
pub use noop_logger::*;
pub use recording_map_surface::*;
