pub mod bearing;
pub mod controller;
pub mod ports;
pub mod region;
pub mod throttle;

pub use bearing::*;
pub use controller::*;
pub use ports::*;
pub use region::*;
pub use throttle::*;
