//! A fixed-shape, fully connected sigmoid network classifying feature vectors into a small closed
//! set of [`Glyph`]s, trained sample by sample with plain stochastic gradient descent.

pub use faer;

mod activation;
pub mod codec;
pub mod core;
mod error;
mod gym;
mod nn;
mod pretty_print;
mod sample;

pub use activation::*;
pub use crate::core::{LEARNING_RATE, Parallelism, param_buffer};
pub use error::*;
pub use gym::*;
pub use nn::*;
pub use pretty_print::*;
pub use sample::*;
