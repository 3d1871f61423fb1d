use rayon::prelude::*;

use crate::{
    ActivationFunction,
    activation_functions::Sigmoid,
    core::{DeltaBuffer, Parallelism, ParamBuffer, ResultBuffer},
};

/// Step size of every gradient update.
pub const LEARNING_RATE: f64 = 0.1;

/// Back propagates `target` through the activations left by the preceding `forward` call and
/// applies one gradient step to `param_buffer`.
///
/// Returns half the squared error of the output layer.
///
/// All three buffers must be created from the same topology, `result_buffer` must hold the
/// activations computed from the current `param_buffer`, and `target` must be as long as the
/// output layer.
pub fn back_propagate(
    target: &[f64],
    param_buffer: &mut ParamBuffer,
    result_buffer: &ResultBuffer,
    delta_buffer: &mut DeltaBuffer,
    parallelism: Parallelism,
) -> f64 {
    let n_layers = result_buffer.n_layers();
    debug_assert_eq!(param_buffer.n_layers() + 1, n_layers);
    debug_assert_eq!(delta_buffer.n_layers(), n_layers);

    // Output layer. Usually only a handful of neurons, never worth fanning out.
    let output = result_buffer.output();
    debug_assert_eq!(output.len(), target.len());
    let mut sum_sq = 0.0f64;
    for ((d_k, &a_k), &t_k) in delta_buffer
        .layer_mut(n_layers - 1)
        .iter_mut()
        .zip(output)
        .zip(target)
    {
        let e_k = t_k - a_k;
        sum_sq += e_k * e_k;
        *d_k = e_k * Sigmoid::deriv_from_output(a_k);
    }

    // Hidden layers, strictly from the back: layer `u` needs the finished deltas of `u + 1`.
    for u in (1..n_layers - 1).rev() {
        let layer_params = param_buffer.layer(u).unwrap();
        let a = result_buffer.layer(u);
        let (d, d_next) = delta_buffer.current_mut_and_next(u);
        let hidden_delta = |i: usize, d_i: &mut f64| {
            let mut sum = 0.0f64;
            for (j, &d_next_j) in d_next.iter().enumerate() {
                sum += d_next_j * layer_params.weights[j * layer_params.n_previous + i];
            }
            *d_i = sum * Sigmoid::deriv_from_output(a[i]);
        };
        match parallelism {
            Parallelism::Sequential => d
                .iter_mut()
                .enumerate()
                .for_each(|(i, d_i)| hidden_delta(i, d_i)),
            Parallelism::Rayon => d
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, d_i)| hidden_delta(i, d_i)),
        }
    }

    // Parameter update. Each destination neuron `j` owns its bias and its contiguous run of
    // incoming weights.
    for u in 0..param_buffer.n_layers() {
        let a_prev = result_buffer.layer(u);
        let d = delta_buffer.layer(u + 1);
        let mut layer = param_buffer.layer_mut(u).unwrap();
        let n_previous = layer.n_previous;
        let update = |((w_j, b_j), &d_j): ((&mut [f64], &mut f64), &f64)| {
            let step = LEARNING_RATE * d_j;
            *b_j += step;
            for (w_ij, &a_i) in w_j.iter_mut().zip(a_prev) {
                *w_ij += step * a_i;
            }
        };
        match parallelism {
            Parallelism::Sequential => layer
                .weights
                .chunks_mut(n_previous)
                .zip(layer.biases.iter_mut())
                .zip(d)
                .for_each(update),
            Parallelism::Rayon => layer
                .weights
                .par_chunks_mut(n_previous)
                .zip(layer.biases.par_iter_mut())
                .zip(d.par_iter())
                .for_each(update),
        }
    }

    sum_sq / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Topology, core::forward};

    fn buffers(widths: &[usize]) -> (ParamBuffer, ResultBuffer, DeltaBuffer) {
        let topology = Topology::new(widths.to_vec()).unwrap();
        (
            ParamBuffer::create(&topology),
            ResultBuffer::create(&topology),
            DeltaBuffer::create(&topology),
        )
    }

    #[test]
    fn single_neuron_step_by_hand() {
        let (mut params, mut results, mut deltas) = buffers(&[1, 1]);
        *params.layer_mut(0).unwrap().weight_mut(0, 0) = 0.5;
        forward(&[0.0], &params, &mut results, Parallelism::Sequential);
        assert_eq!(results.output(), &[0.5]);
        let loss = back_propagate(
            &[1.0],
            &mut params,
            &results,
            &mut deltas,
            Parallelism::Sequential,
        );
        // e = 0.5, delta = 0.5 * 0.25
        assert_eq!(loss, 0.125);
        assert_eq!(deltas.layer(1), &[0.125]);
        let layer = params.layer(0).unwrap();
        assert_eq!(layer.biases, &[LEARNING_RATE * 0.125]);
        // Input was zero, so the weight does not move.
        assert_eq!(layer.weights, &[0.5]);
    }

    #[test]
    fn hidden_delta_uses_outgoing_weights() {
        let (mut params, mut results, mut deltas) = buffers(&[1, 2, 1]);
        {
            let mut layer = params.layer_mut(1).unwrap();
            *layer.weight_mut(0, 0) = 1.0;
            *layer.weight_mut(1, 0) = -2.0;
        }
        forward(&[0.3], &params, &mut results, Parallelism::Sequential);
        let weights_before = params.layer(1).unwrap().weights.to_vec();
        back_propagate(
            &[0.0],
            &mut params,
            &results,
            &mut deltas,
            Parallelism::Sequential,
        );
        let d_out = deltas.layer(2)[0];
        let a_hidden = results.layer(1);
        for i in 0..2 {
            let expected = d_out * weights_before[i] * (a_hidden[i] * (1.0 - a_hidden[i]));
            assert_eq!(deltas.layer(1)[i], expected);
        }
    }

    #[test]
    fn sequential_and_rayon_updates_agree() {
        let (mut params_seq, mut results, mut deltas) = buffers(&[3, 16, 8, 2]);
        for (k, p) in params_seq.as_mut_slice().iter_mut().enumerate() {
            *p = ((k * 37 % 11) as f64 - 5.0) / 10.0;
        }
        let mut params_par = params_seq.clone();
        let input = [0.1, 0.7, 0.4];
        let target = [1.0, 0.0];

        forward(&input, &params_seq, &mut results, Parallelism::Sequential);
        let loss_seq = back_propagate(
            &target,
            &mut params_seq,
            &results,
            &mut deltas,
            Parallelism::Sequential,
        );
        forward(&input, &params_par, &mut results, Parallelism::Rayon);
        let loss_par = back_propagate(
            &target,
            &mut params_par,
            &results,
            &mut deltas,
            Parallelism::Rayon,
        );

        assert_eq!(loss_seq, loss_par);
        assert_eq!(params_seq.as_slice(), params_par.as_slice());
    }
}
