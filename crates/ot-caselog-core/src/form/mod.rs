//! Case form controller and its advisory seam.

mod advisor;
mod controller;
mod suggestions;

pub use advisor::*;
pub use controller::*;
pub use suggestions::*;
