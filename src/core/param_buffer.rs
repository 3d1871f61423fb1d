use std::ops::Range;

use faer::prelude::*;
use rand::{Rng, distr::uniform::SampleRange};

use crate::{PrettyPrintParams, Topology};

/// Range the parameters are drawn from on initialization.
pub const INIT_RANGE: Range<f64> = -0.5..0.5;

#[derive(Debug, Clone, Copy)]
struct LayerSpan {
    n: usize,
    n_previous: usize,
    offset_w: usize,
    offset_b: usize,
}

/// Immutable view of the parameters between two adjacent layers.
#[derive(Debug, Clone, Copy)]
pub struct LayerRef<'a> {
    /// Number of neurons in this layer.
    pub n: usize,
    /// Number of neurons in the previous layer.
    pub n_previous: usize,
    /// Destination-major: the `n_previous` weights feeding neuron `j` are contiguous.
    pub weights: &'a [f64],
    pub biases: &'a [f64],
}

impl<'a> LayerRef<'a> {
    /// Weight matrix of shape `n_previous × n`, `w[(i, j)]` connecting source `i` to
    /// destination `j`.
    pub fn w(&self) -> MatRef<'a, f64> {
        MatRef::from_column_major_slice(self.weights, self.n_previous, self.n)
    }

    pub fn b(&self) -> ColRef<'a, f64> {
        ColRef::from_slice(self.biases)
    }

    /// The weights feeding neuron `j`.
    pub fn weights_into(&self, j: usize) -> &'a [f64] {
        &self.weights[j * self.n_previous..(j + 1) * self.n_previous]
    }
}

/// Mutable view of the parameters between two adjacent layers.
#[derive(Debug)]
pub struct LayerMut<'a> {
    /// Number of neurons in this layer.
    pub n: usize,
    /// Number of neurons in the previous layer.
    pub n_previous: usize,
    /// Same layout as [`LayerRef::weights`].
    pub weights: &'a mut [f64],
    pub biases: &'a mut [f64],
}

impl LayerMut<'_> {
    pub fn weight_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        &mut self.weights[j * self.n_previous + i]
    }
}

/// Buffer for storing neural network parameters.
///
/// Every layer's weights are followed by its biases, all inside one flat allocation.
#[derive(Clone)]
pub struct ParamBuffer {
    layers: Box<[LayerSpan]>,
    buffer: Box<[f64]>,
}

impl ParamBuffer {
    /// Creates a zeroed parameter buffer for `topology`.
    pub fn create(topology: &Topology) -> Self {
        let mut layers = Vec::with_capacity(topology.n_param_layers());
        let mut counter = 0usize;
        for (&n_previous, &n) in topology.widths().iter().zip(&topology.widths()[1..]) {
            let offset_w = counter;
            let offset_b = offset_w + n * n_previous;
            counter = offset_b + n;
            layers.push(LayerSpan {
                n,
                n_previous,
                offset_w,
                offset_b,
            });
        }
        assert!(counter != 0);
        let buffer: Box<[f64]> = bytemuck::zeroed_slice_box(counter);
        Self {
            layers: layers.into_boxed_slice(),
            buffer,
        }
    }

    pub fn randomize(&mut self, rng: &mut impl Rng, range: impl SampleRange<f64> + Clone) {
        for p in self.as_mut_slice() {
            *p = rng.random_range(range.clone());
        }
    }

    pub fn pretty_print_layer(&self, index: usize) -> Option<PrettyPrintParams<'_>> {
        let layer = self.layer(index)?;
        Some(PrettyPrintParams::new(index, layer))
    }

    /// Direct access to the underlying buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.buffer
    }

    /// Direct access to the underlying buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

    /// Number of weight/bias layers, one less than the number of neuron layers.
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn n_weights(&self) -> usize {
        self.layers.iter().map(|l| l.n * l.n_previous).sum()
    }

    pub fn n_biases(&self) -> usize {
        self.layers.iter().map(|l| l.n).sum()
    }

    /// Get a immutable view of a layer.
    /// Returns `None` if `index` is out of range.
    pub fn layer(&self, index: usize) -> Option<LayerRef<'_>> {
        let span = *self.layers.get(index)?;
        Some(LayerRef {
            n: span.n,
            n_previous: span.n_previous,
            weights: &self.buffer[span.offset_w..span.offset_b],
            biases: &self.buffer[span.offset_b..span.offset_b + span.n],
        })
    }

    /// Get a mutable view of a layer.
    /// Returns `None` if `index` is out of range.
    pub fn layer_mut(&mut self, index: usize) -> Option<LayerMut<'_>> {
        let span = *self.layers.get(index)?;
        let region = &mut self.buffer[span.offset_w..span.offset_b + span.n];
        let (weights, biases) = region.split_at_mut(span.offset_b - span.offset_w);
        Some(LayerMut {
            n: span.n,
            n_previous: span.n_previous,
            weights,
            biases,
        })
    }

    pub fn layers(&self) -> impl Iterator<Item = LayerRef<'_>> {
        (0..self.n_layers()).filter_map(|index| self.layer(index))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn layout_matches_topology() {
        let topology = Topology::new([3, 4, 2]).unwrap();
        let params = ParamBuffer::create(&topology);
        assert_eq!(params.n_layers(), 2);
        assert_eq!(params.n_weights(), 3 * 4 + 4 * 2);
        assert_eq!(params.n_biases(), 4 + 2);
        assert_eq!(params.as_slice().len(), 20 + 6);
        let layer = params.layer(1).unwrap();
        assert_eq!((layer.n_previous, layer.n), (4, 2));
        assert_eq!(layer.w().nrows(), 4);
        assert_eq!(layer.w().ncols(), 2);
        assert!(params.layer(2).is_none());
    }

    #[test]
    fn weight_mut_addresses_source_and_destination() {
        let topology = Topology::new([2, 3]).unwrap();
        let mut params = ParamBuffer::create(&topology);
        *params.layer_mut(0).unwrap().weight_mut(1, 2) = 7.0;
        let layer = params.layer(0).unwrap();
        assert_eq!(layer.w()[(1, 2)], 7.0);
        assert_eq!(layer.weights_into(2), &[0.0, 7.0]);
        assert_eq!(layer.biases, &[0.0; 3]);
    }

    #[test]
    fn randomize_stays_in_range() {
        let topology = Topology::new([5, 8, 3]).unwrap();
        let mut params = ParamBuffer::create(&topology);
        params.randomize(&mut StdRng::seed_from_u64(7), INIT_RANGE);
        assert!(params.as_slice().iter().all(|p| INIT_RANGE.contains(p)));
        assert!(params.as_slice().iter().any(|&p| p != 0.0));
    }
}
