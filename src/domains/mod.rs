pub mod buffer;
pub mod camera;
pub mod logger;
pub mod motion;
pub mod origin;
pub mod subscription;
pub mod tracking;

pub use buffer::*;
pub use camera::*;
pub use logger::*;
pub use motion::*;
pub use origin::*;
pub use subscription::*;
pub use tracking::*;
