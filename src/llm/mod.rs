// Inference engine abstraction layer

pub mod provider;
pub mod tgi;
pub mod echo;

pub use provider::*;

#[cfg(test)]
pub(crate) mod testing;
