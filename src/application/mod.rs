pub mod pipeline;
pub mod tracking_session;

pub use pipeline::*;
pub use tracking_session::*;
