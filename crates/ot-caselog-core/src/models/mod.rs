//! Domain models for the case log.

mod candidate;
mod case;
mod preferences;
mod vocabulary;

#[cfg(test)]
pub(crate) use case::fixtures;

pub use candidate::*;
pub use case::*;
pub use preferences::*;
pub use vocabulary::*;
