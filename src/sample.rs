use std::{fs, path::Path, str::FromStr};

use derive_more::{Deref, DerefMut, Display};
use rand::{Rng, seq::SliceRandom};

use crate::{Error, NeuralNetwork, Result, core::Parallelism};

/// The closed set of classes a network can recognise.
///
/// The discriminant of a known glyph is the index of its output neuron.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Glyph {
    #[display("A")]
    A,
    #[display("B")]
    B,
    #[display("W")]
    W,
    #[display("G")]
    G,
    #[display("D")]
    D,
    #[display("E")]
    E,
    #[display("V")]
    V,
    #[display("Z")]
    Z,
    #[display("I")]
    I,
    #[display("K")]
    K,
    /// No class known, or not yet predicted.
    #[default]
    #[display("?")]
    Unknown,
}

impl Glyph {
    pub const KNOWN: [Glyph; 10] = [
        Glyph::A,
        Glyph::B,
        Glyph::W,
        Glyph::G,
        Glyph::D,
        Glyph::E,
        Glyph::V,
        Glyph::Z,
        Glyph::I,
        Glyph::K,
    ];

    /// Number of known glyphs; the widest output layer a sample can describe.
    pub const COUNT: usize = Self::KNOWN.len();

    pub fn from_index(index: usize) -> Glyph {
        Self::KNOWN.get(index).copied().unwrap_or(Glyph::Unknown)
    }

    pub fn index(self) -> Option<usize> {
        Self::KNOWN.iter().position(|&glyph| glyph == self)
    }

    pub fn is_known(self) -> bool {
        self != Glyph::Unknown
    }
}

impl FromStr for Glyph {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        if s == "?" {
            return Ok(Glyph::Unknown);
        }
        Self::KNOWN
            .iter()
            .copied()
            .find(|glyph| glyph.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown glyph {s:?}"))
    }
}

/// One observation: the input vector, the one-hot target and the result of the last prediction.
#[derive(Debug, Clone)]
pub struct Sample {
    input: Vec<f64>,
    target: Vec<f64>,
    output: Vec<f64>,
    error: Vec<f64>,
    actual: Glyph,
    recognized: Glyph,
}

impl Sample {
    /// `n_classes` is the width of the output layer the sample will be used with.
    pub fn new(input: impl Into<Vec<f64>>, n_classes: usize, actual: Glyph) -> Result<Self> {
        if n_classes > Glyph::COUNT {
            return Err(Error::ShapeMismatch {
                what: "class count",
                expected: Glyph::COUNT,
                actual: n_classes,
            });
        }
        let mut target = vec![0.0; n_classes];
        if let Some(index) = actual.index() {
            if index >= n_classes {
                return Err(Error::ShapeMismatch {
                    what: "class index",
                    expected: n_classes,
                    actual: index,
                });
            }
            target[index] = 1.0;
        }
        Ok(Self {
            input: input.into(),
            target,
            output: vec![0.0; n_classes],
            error: vec![0.0; n_classes],
            actual,
            recognized: Glyph::Unknown,
        })
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    /// One-hot encoding of the actual class; all zeros when it is unknown.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// `output - target` of the last prediction.
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    pub fn actual(&self) -> Glyph {
        self.actual
    }

    pub fn recognized(&self) -> Glyph {
        self.recognized
    }

    /// Records a network output and picks the most activated class. The first index wins ties.
    pub fn process_prediction(&mut self, output: &[f64]) -> Glyph {
        debug_assert_eq!(output.len(), self.target.len());
        self.output.clear();
        self.output.extend_from_slice(output);
        let mut max_index = 0usize;
        let mut max_value = f64::NEG_INFINITY;
        for (k, (&o_k, &t_k)) in output.iter().zip(&self.target).enumerate() {
            self.error[k] = o_k - t_k;
            if o_k > max_value {
                max_value = o_k;
                max_index = k;
            }
        }
        self.recognized = Glyph::from_index(max_index);
        self.recognized
    }

    /// Sum of the squared per-unit errors of the last prediction.
    pub fn estimated_error(&self) -> f64 {
        self.error.iter().map(|e| e * e).sum()
    }

    pub fn is_correct(&self) -> bool {
        self.actual == self.recognized
    }
}

#[derive(Debug, Clone, Default, Deref, DerefMut)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl From<Vec<Sample>> for SampleSet {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.samples.shuffle(rng);
    }

    /// Fraction of samples `nn` classifies as their actual class. Zero for an empty set.
    pub fn accuracy(&mut self, nn: &mut NeuralNetwork, parallelism: Parallelism) -> Result<f64> {
        if self.samples.is_empty() {
            return Ok(0.0);
        }
        let mut n_correct = 0usize;
        for sample in &mut self.samples {
            if nn.predict(sample, parallelism)? == sample.actual() {
                n_correct += 1;
            }
        }
        Ok(n_correct as f64 / self.samples.len() as f64)
    }

    /// Parses one sample per line: a glyph name (or `?`) followed by `n_inputs` values.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str, n_inputs: usize, n_classes: usize) -> Result<Self> {
        let mut set = SampleSet::new();
        for (line_index, line) in text.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let label = tokens.next().unwrap_or_default();
            let glyph: Glyph = label
                .parse()
                .map_err(|message| Error::parse(line_number, message))?;
            let input = tokens
                .map(|token| {
                    token.parse::<f64>().map_err(|_| {
                        Error::parse(line_number, format!("invalid feature value {token:?}"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            Error::check_len("sample input", n_inputs, input.len())?;
            set.push(Sample::new(input, n_classes, glyph)?);
        }
        Ok(set)
    }

    pub fn read_from(path: impl AsRef<Path>, n_inputs: usize, n_classes: usize) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, n_inputs, n_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_indices() {
        assert_eq!(Glyph::from_index(0), Glyph::A);
        assert_eq!(Glyph::from_index(9), Glyph::K);
        assert_eq!(Glyph::from_index(10), Glyph::Unknown);
        assert_eq!(Glyph::B.index(), Some(1));
        assert_eq!(Glyph::Unknown.index(), None);
        assert_eq!("w".parse::<Glyph>(), Ok(Glyph::W));
        assert_eq!("?".parse::<Glyph>(), Ok(Glyph::Unknown));
        assert!("Q".parse::<Glyph>().is_err());
    }

    #[test]
    fn target_is_one_hot() {
        let sample = Sample::new([0.1, 0.2], 3, Glyph::W).unwrap();
        assert_eq!(sample.target(), &[0.0, 0.0, 1.0]);
        assert_eq!(sample.recognized(), Glyph::Unknown);

        let unlabeled = Sample::new([0.1, 0.2], 3, Glyph::Unknown).unwrap();
        assert_eq!(unlabeled.target(), &[0.0; 3]);
    }

    #[test]
    fn class_outside_output_layer_is_rejected() {
        assert!(matches!(
            Sample::new([0.0], 2, Glyph::G),
            Err(Error::ShapeMismatch {
                what: "class index",
                ..
            })
        ));
        assert!(Sample::new([0.0], 11, Glyph::A).is_err());
    }

    #[test]
    fn argmax_first_index_wins_ties() {
        let mut sample = Sample::new([0.0], 2, Glyph::B).unwrap();
        assert_eq!(sample.process_prediction(&[0.5, 0.5]), Glyph::A);
        assert_eq!(sample.error(), &[0.5, -0.5]);
        assert_eq!(sample.estimated_error(), 0.5);
        assert!(!sample.is_correct());

        assert_eq!(sample.process_prediction(&[0.2, 0.9]), Glyph::B);
        assert!(sample.is_correct());
    }

    #[test]
    fn parse_sample_lines() {
        let text = "# label features\nA 0.0 1.0\n\n? 0.5 0.5\n";
        let set = SampleSet::parse(text, 2, 2).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].actual(), Glyph::A);
        assert_eq!(set[1].actual(), Glyph::Unknown);

        assert!(matches!(
            SampleSet::parse("A 0.0 oops", 2, 2),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            SampleSet::parse("A 0.0", 2, 2),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
