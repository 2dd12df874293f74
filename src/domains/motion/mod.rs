pub mod interpolator;
pub mod marker;
pub mod readiness;

pub use interpolator::*;
pub use marker::*;
pub use readiness::*;
