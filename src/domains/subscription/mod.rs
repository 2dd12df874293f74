pub mod manager;
pub mod observers;
pub mod ports;

pub use manager::*;
pub use observers::*;
pub use ports::*;
