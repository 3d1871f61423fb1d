use std::{fmt, str::FromStr};

use rand::Rng;

use crate::{
    Error, Glyph, Result, Sample,
    core::{
        DeltaBuffer, Parallelism, ParamBuffer, ResultBuffer, back_propagate, forward,
        param_buffer::{self, INIT_RANGE},
    },
};

/// Neuron counts of every layer, input layer first and output layer last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    widths: Box<[usize]>,
}

impl Topology {
    pub fn new(widths: impl Into<Vec<usize>>) -> Result<Self> {
        let widths: Vec<usize> = widths.into();
        if widths.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "at least an input and an output layer are required, got {} layer(s)",
                widths.len()
            )));
        }
        if let Some(index) = widths.iter().position(|&n| n == 0) {
            return Err(Error::InvalidTopology(format!("layer {index} has no neurons")));
        }
        Ok(Self {
            widths: widths.into_boxed_slice(),
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.widths[0]
    }

    pub fn n_outputs(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Number of neuron layers, input layer included.
    pub fn n_layers(&self) -> usize {
        self.widths.len()
    }

    /// Number of weight/bias layers.
    pub fn n_param_layers(&self) -> usize {
        self.widths.len() - 1
    }
}

/// Formats as the `;`-separated widths used by the model file.
impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.widths.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for n in iter {
            write!(f, ";{n}")?;
        }
        Ok(())
    }
}

impl FromStr for Topology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let widths = s
            .trim()
            .split(';')
            .enumerate()
            .map(|(index, token)| {
                token.trim().parse::<usize>().map_err(|_| {
                    Error::parse(1, format!("invalid layer width {token:?} at position {index}"))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        Topology::new(widths)
    }
}

/// A fully connected sigmoid network together with its working buffers.
#[derive(Clone)]
pub struct NeuralNetwork {
    topology: Topology,
    params: ParamBuffer,
    results: ResultBuffer,
    deltas: DeltaBuffer,
}

impl NeuralNetwork {
    /// Creates a network with parameters drawn uniformly from `[-0.5, 0.5)`.
    pub fn new(topology: Topology) -> Self {
        Self::with_rng(topology, &mut rand::rng())
    }

    pub fn with_rng(topology: Topology, rng: &mut impl Rng) -> Self {
        let mut nn = Self::zeroed(topology);
        nn.params.randomize(rng, INIT_RANGE);
        nn
    }

    /// Creates a network with every weight and bias set to zero.
    pub fn zeroed(topology: Topology) -> Self {
        let params = ParamBuffer::create(&topology);
        let results = ResultBuffer::create(&topology);
        let deltas = DeltaBuffer::create(&topology);
        Self {
            topology,
            params,
            results,
            deltas,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn n_inputs(&self) -> usize {
        self.topology().n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.topology().n_outputs()
    }

    pub fn params(&self) -> &ParamBuffer {
        &self.params
    }

    pub fn params_as_slice(&self) -> &[f64] {
        self.params().as_slice()
    }

    pub fn params_layer(&self, index: usize) -> Option<param_buffer::LayerRef<'_>> {
        self.params().layer(index)
    }

    pub fn params_layer_mut(&mut self, index: usize) -> Option<param_buffer::LayerMut<'_>> {
        self.params.layer_mut(index)
    }

    pub(crate) fn params_mut(&mut self) -> &mut ParamBuffer {
        &mut self.params
    }

    /// Activations of every layer from the last `compute`.
    pub fn results(&self) -> &ResultBuffer {
        &self.results
    }

    /// Output of the last `compute`.
    pub fn output(&self) -> &[f64] {
        self.results.output()
    }

    pub fn compute(&mut self, input: &[f64], parallelism: Parallelism) -> Result<&[f64]> {
        Error::check_len("input", self.n_inputs(), input.len())?;
        forward(input, &self.params, &mut self.results, parallelism);
        Ok(self.results.output())
    }

    /// Applies one gradient step towards `target` using the activations of the last `compute`.
    ///
    /// Returns half the squared output error measured before the step.
    pub fn backpropagate(&mut self, target: &[f64], parallelism: Parallelism) -> Result<f64> {
        Error::check_len("target", self.n_outputs(), target.len())?;
        Ok(back_propagate(
            target,
            &mut self.params,
            &self.results,
            &mut self.deltas,
            parallelism,
        ))
    }

    /// Half the squared error on one input/target pair, without touching the parameters.
    pub fn loss(&mut self, input: &[f64], target: &[f64]) -> Result<f64> {
        Error::check_len("target", self.n_outputs(), target.len())?;
        let output = self.compute(input, Parallelism::Sequential)?;
        let sum_sq: f64 = output
            .iter()
            .zip(target)
            .map(|(&a_k, &t_k)| (t_k - a_k) * (t_k - a_k))
            .sum();
        Ok(sum_sq / 2.0)
    }

    /// Classifies `sample`, recording the output, the per-unit error and the predicted class on
    /// it.
    pub fn predict(&mut self, sample: &mut Sample, parallelism: Parallelism) -> Result<Glyph> {
        Error::check_len("sample target", self.n_outputs(), sample.target().len())?;
        let output = self.compute(sample.input(), parallelism)?;
        Ok(sample.process_prediction(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_rejects_degenerate_shapes() {
        assert!(matches!(
            Topology::new([4]),
            Err(Error::InvalidTopology(_))
        ));
        assert!(matches!(
            Topology::new([4, 0, 2]),
            Err(Error::InvalidTopology(_))
        ));
    }

    #[test]
    fn topology_text_form() {
        let topology: Topology = "2;3;2".parse().unwrap();
        assert_eq!(topology.widths(), &[2, 3, 2]);
        assert_eq!(topology.to_string(), "2;3;2");
        assert!(matches!(
            "2;x;2".parse::<Topology>(),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn compute_rejects_wrong_input_length() {
        let mut nn = NeuralNetwork::zeroed(Topology::new([2, 1]).unwrap());
        let err = nn.compute(&[0.0; 3], Parallelism::Sequential).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                what: "input",
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn backpropagate_rejects_wrong_target_before_mutating() {
        let mut nn = NeuralNetwork::new(Topology::new([2, 3, 2]).unwrap());
        nn.compute(&[0.2, 0.4], Parallelism::Sequential).unwrap();
        let before = nn.params_as_slice().to_vec();
        assert!(nn.backpropagate(&[1.0], Parallelism::Sequential).is_err());
        assert_eq!(nn.params_as_slice(), &before[..]);
    }

    #[test]
    fn single_neuron_outputs() {
        let mut nn = NeuralNetwork::zeroed(Topology::new([1, 1]).unwrap());
        *nn.params_layer_mut(0).unwrap().weight_mut(0, 0) = 0.5;
        assert_eq!(nn.compute(&[0.0], Parallelism::Sequential).unwrap(), &[0.5]);

        *nn.params_layer_mut(0).unwrap().weight_mut(0, 0) = 1.0;
        let output = nn.compute(&[1.0], Parallelism::Sequential).unwrap()[0];
        assert!((output - 0.7310585786300049).abs() < 1e-15);
    }

    #[test]
    fn loss_does_not_train() {
        let mut nn = NeuralNetwork::new(Topology::new([2, 2]).unwrap());
        let before = nn.params_as_slice().to_vec();
        let loss = nn.loss(&[0.5, 0.5], &[1.0, 0.0]).unwrap();
        assert!(loss > 0.0);
        assert_eq!(nn.params_as_slice(), &before[..]);
    }
}
