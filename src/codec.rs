//! Plain-text model file.
//!
//! ```text
//! 2;3;2
//! w w w ... b b b
//! ```
//!
//! The first line is the topology. The second holds every weight, iterated by layer, then source
//! neuron, then destination neuron, followed by every bias, iterated by layer, then neuron.
//! Values use Rust's `f64` formatting, which is locale independent and round-trips exactly.

use std::{fs, io, path::Path};

use crate::{Error, NeuralNetwork, Result, Topology, core::ParamBuffer};

/// Renders `params` in model file order.
pub fn encode(topology: &Topology, params: &ParamBuffer) -> String {
    let weights = params.layers().flat_map(|layer| {
        let w = layer.w();
        (0..layer.n_previous)
            .flat_map(move |i| (0..layer.n).map(move |j| w[(i, j)]))
    });
    let biases = params.layers().flat_map(|layer| layer.biases.iter().copied());
    let values: Vec<String> = weights.chain(biases).map(|v| v.to_string()).collect();
    format!("{topology}\n{}\n", values.join(" "))
}

/// Parses a model file whose topology must equal `topology`.
///
/// Returns the values in model file order; nothing is written anywhere.
pub fn decode(text: &str, topology: &Topology, expected_len: usize) -> Result<Vec<f64>> {
    let mut lines = text.lines();
    let topology_line = lines
        .next()
        .ok_or_else(|| Error::parse(1, "missing topology line"))?;
    let file_topology: Topology = topology_line.parse()?;
    if &file_topology != topology {
        return Err(Error::TopologyMismatch {
            expected: topology.to_string(),
            actual: file_topology.to_string(),
        });
    }
    let values_line = lines.next().unwrap_or_default();
    let mut values = Vec::with_capacity(expected_len);
    for (index, token) in values_line.split_whitespace().enumerate() {
        if index >= expected_len {
            return Err(Error::parse(
                2,
                format!("unexpected value {token:?} at position {index}, expected {expected_len} values"),
            ));
        }
        let value: f64 = token.parse().map_err(|_| {
            Error::parse(2, format!("invalid value {token:?} at position {index}"))
        })?;
        if !value.is_finite() {
            return Err(Error::parse(
                2,
                format!("non-finite value {token:?} at position {index}"),
            ));
        }
        values.push(value);
    }
    if values.len() < expected_len {
        return Err(Error::parse(
            2,
            format!(
                "missing value at position {}, expected {expected_len} values",
                values.len()
            ),
        ));
    }
    Ok(values)
}

/// Writes values in model file order back into `params`.
///
/// `values` must come from `decode` for the same topology, so it holds exactly one value per
/// parameter.
fn apply(values: &[f64], params: &mut ParamBuffer) {
    let (weights, biases) = values.split_at(params.n_weights());
    let mut weights = weights.iter();
    let mut biases = biases.iter();
    for index in 0..params.n_layers() {
        let mut layer = params.layer_mut(index).unwrap();
        for i in 0..layer.n_previous {
            for j in 0..layer.n {
                *layer.weight_mut(i, j) = *weights.next().unwrap();
            }
        }
        for b_j in layer.biases.iter_mut() {
            *b_j = *biases.next().unwrap();
        }
    }
}

fn read_model(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ModelNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })
}

impl NeuralNetwork {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, encode(self.topology(), self.params()))?;
        log::info!(
            "saved {} parameters of {} to {}",
            self.params_as_slice().len(),
            self.topology(),
            path.display()
        );
        Ok(())
    }

    /// Replaces the parameters with those stored at `path`.
    ///
    /// The file must describe a network of the same topology. Either every parameter is replaced
    /// or, on error, none is.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = read_model(path)?;
        let expected_len = self.params_as_slice().len();
        let values = decode(&text, self.topology(), expected_len)?;
        apply(&values, self.params_mut());
        log::info!("loaded {expected_len} parameters from {}", path.display());
        Ok(())
    }

    /// Creates a network shaped after the topology line of the model file at `path` and loads
    /// its parameters.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_model(path)?;
        let topology: Topology = text
            .lines()
            .next()
            .ok_or_else(|| Error::parse(1, "missing topology line"))?
            .parse()?;
        let mut nn = NeuralNetwork::zeroed(topology);
        let values = decode(&text, nn.topology(), nn.params_as_slice().len())?;
        apply(&values, nn.params_mut());
        log::info!("restored {} network from {}", nn.topology(), path.display());
        Ok(nn)
    }
}
