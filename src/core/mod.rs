//! Core parts of the algorithms without abstraction.
//!
//! Shapes are not checked here beyond `debug_assert!`s; `NeuralNetwork` validates vector lengths
//! before calling into this module.

pub mod delta_buffer;
pub mod param_buffer;
pub mod result_buffer;

pub use delta_buffer::DeltaBuffer;
pub use param_buffer::ParamBuffer;
pub use result_buffer::ResultBuffer;

mod back_propagation;
mod forward;

pub use back_propagation::*;
pub use forward::*;

/// Whether the per-neuron loops inside one layer are fanned out over the rayon thread pool.
///
/// Layers are always processed one after another, and samples are always trained one after
/// another, regardless of this setting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Rayon,
}

impl From<bool> for Parallelism {
    fn from(parallel: bool) -> Self {
        match parallel {
            true => Parallelism::Rayon,
            false => Parallelism::Sequential,
        }
    }
}
