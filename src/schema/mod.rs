//! Schema module - Parameter, reporting and run configuration types.

mod params;
mod run;

pub use params::*;
pub use run::*;
