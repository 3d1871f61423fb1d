use crate::Topology;

/// Buffer for storing neural network activation results.
///
/// Holds one activation vector per neuron layer, layer 0 being a copy of the input.
#[derive(Debug, Clone)]
pub struct ResultBuffer {
    offsets: Box<[usize]>,
    buffer: Box<[f64]>,
}

impl ResultBuffer {
    pub fn create(topology: &Topology) -> Self {
        let (offsets, n_floats) = layer_offsets(topology);
        Self {
            offsets,
            buffer: bytemuck::zeroed_slice_box(n_floats),
        }
    }

    /// Number of neuron layers, input layer included.
    pub fn n_layers(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Activations of layer `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn layer(&self, index: usize) -> &[f64] {
        &self.buffer[self.offsets[index]..self.offsets[index + 1]]
    }

    pub fn layer_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.buffer[self.offsets[index]..self.offsets[index + 1]]
    }

    /// Activations of layer `index - 1` together with a mutable view of layer `index`.
    pub fn previous_and_current_mut(&mut self, index: usize) -> (&[f64], &mut [f64]) {
        assert!(index >= 1 && index < self.n_layers());
        let (head, tail) = self.buffer.split_at_mut(self.offsets[index]);
        let previous = &head[self.offsets[index - 1]..];
        let current = &mut tail[..self.offsets[index + 1] - self.offsets[index]];
        (previous, current)
    }

    pub fn output(&self) -> &[f64] {
        self.layer(self.n_layers() - 1)
    }
}

/// Start offsets of each layer inside a flat per-neuron buffer, followed by the total length.
pub(crate) fn layer_offsets(topology: &Topology) -> (Box<[usize]>, usize) {
    let mut offsets = Vec::with_capacity(topology.n_layers() + 1);
    let mut counter = 0usize;
    for &n in topology.widths() {
        offsets.push(counter);
        counter += n;
    }
    offsets.push(counter);
    (offsets.into_boxed_slice(), counter)
}
