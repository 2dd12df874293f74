pub mod ports;
pub mod resolver;
pub mod types;

pub use ports::*;
pub use resolver::*;
pub use types::*;
