use crate::{Topology, core::result_buffer::layer_offsets};

/// Per-neuron error signals of one back propagation pass.
///
/// Same layout as `ResultBuffer`. The input layer's slot is allocated but never written.
#[derive(Debug, Clone)]
pub struct DeltaBuffer {
    offsets: Box<[usize]>,
    buffer: Box<[f64]>,
}

impl DeltaBuffer {
    pub fn create(topology: &Topology) -> Self {
        let (offsets, n_floats) = layer_offsets(topology);
        Self {
            offsets,
            buffer: bytemuck::zeroed_slice_box(n_floats),
        }
    }

    pub fn n_layers(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn layer(&self, index: usize) -> &[f64] {
        &self.buffer[self.offsets[index]..self.offsets[index + 1]]
    }

    pub fn layer_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.buffer[self.offsets[index]..self.offsets[index + 1]]
    }

    /// Mutable deltas of layer `index` together with the finished deltas of layer `index + 1`.
    pub fn current_mut_and_next(&mut self, index: usize) -> (&mut [f64], &[f64]) {
        assert!(index + 1 < self.n_layers());
        let (head, tail) = self.buffer.split_at_mut(self.offsets[index + 1]);
        let current = &mut head[self.offsets[index]..];
        let next = &tail[..self.offsets[index + 2] - self.offsets[index + 1]];
        (current, next)
    }
}
