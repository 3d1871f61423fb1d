use rayon::prelude::*;

use crate::{
    ActivationFunction,
    activation_functions::Sigmoid,
    core::{Parallelism, ParamBuffer, ResultBuffer},
};

/// `sigmoid(Σ_i a_prev[i] * w_j[i] + b_j)`.
///
/// Both the sequential and the rayon path go through this function, so they sum in the same
/// order and produce identical bits.
#[inline(always)]
pub(crate) fn neuron_activation(a_prev: &[f64], w_j: &[f64], b_j: f64) -> f64 {
    debug_assert_eq!(a_prev.len(), w_j.len());
    let mut sum = 0.0f64;
    for (&a_i, &w_ij) in a_prev.iter().zip(w_j) {
        sum += a_i * w_ij;
    }
    sum += b_j;
    Sigmoid::apply(sum)
}

/// Runs `input` through the network, leaving every layer's activations in `result_buffer`.
///
/// `param_buffer` and `result_buffer` must be created from the same topology and `input` must be
/// as long as the input layer.
pub fn forward(
    input: &[f64],
    param_buffer: &ParamBuffer,
    result_buffer: &mut ResultBuffer,
    parallelism: Parallelism,
) {
    debug_assert_eq!(param_buffer.n_layers() + 1, result_buffer.n_layers());
    result_buffer.layer_mut(0).copy_from_slice(input);
    for (u, layer_params) in param_buffer.layers().enumerate() {
        let (a_prev, a) = result_buffer.previous_and_current_mut(u + 1);
        debug_assert_eq!(a_prev.len(), layer_params.n_previous);
        debug_assert_eq!(a.len(), layer_params.n);
        match parallelism {
            Parallelism::Sequential => {
                for (j, a_j) in a.iter_mut().enumerate() {
                    *a_j = neuron_activation(
                        a_prev,
                        layer_params.weights_into(j),
                        layer_params.biases[j],
                    );
                }
            }
            Parallelism::Rayon => {
                a.par_iter_mut().enumerate().for_each(|(j, a_j)| {
                    *a_j = neuron_activation(
                        a_prev,
                        layer_params.weights_into(j),
                        layer_params.biases[j],
                    );
                });
            }
        }
    }
}
