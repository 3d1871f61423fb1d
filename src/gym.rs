use std::time::{Duration, Instant};

use rand::{Rng, rngs::ThreadRng};

use crate::{Error, NeuralNetwork, Result, Sample, SampleSet, core::Parallelism};

/// Hard ceiling on the iterations of `Gym::train_one`.
pub const MAX_SINGLE_SAMPLE_ITERATIONS: usize = 10_000;

/// Loss reported by `Gym::train_on_dataset` when no epoch has run.
pub const NOT_TRAINED_LOSS: f64 = f64::MAX;

/// Reported after every epoch of `Gym::train_on_dataset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochProgress {
    /// Zero based.
    pub epoch: usize,
    pub n_epochs: usize,
    /// Sum (not mean) of the per-sample losses of this epoch.
    pub loss_sum: f64,
    pub elapsed: Duration,
}

impl EpochProgress {
    /// `epoch / n_epochs`, i.e. the fraction of epochs completed before this one.
    pub fn fraction(&self) -> f64 {
        self.epoch as f64 / self.n_epochs as f64
    }
}

/// Outcome of `Gym::train_one`. Hitting the iteration cap is not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOneReport {
    pub iterations: usize,
    /// Loss measured on the last iteration, before its update.
    pub loss: f64,
    pub converged: bool,
}

/// Trains a borrowed network by plain stochastic gradient descent.
///
/// The network is exclusively borrowed for the lifetime of the gym, so it cannot be read by
/// anyone else while its parameters are being updated.
pub struct Gym<'a, R: Rng = ThreadRng> {
    nn: &'a mut NeuralNetwork,
    rng: R,
    on_progress: Option<Box<dyn FnMut(&EpochProgress) + 'a>>,
}

impl<'a> Gym<'a> {
    pub fn new(nn: &'a mut NeuralNetwork) -> Self {
        Self::with_rng(nn, rand::rng())
    }
}

impl<'a, R: Rng> Gym<'a, R> {
    /// Uses `rng` to shuffle the sample order of every epoch.
    pub fn with_rng(nn: &'a mut NeuralNetwork, rng: R) -> Self {
        Self {
            nn,
            rng,
            on_progress: None,
        }
    }

    /// Registers a callback invoked after every epoch.
    pub fn on_progress(mut self, f: impl FnMut(&EpochProgress) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn nn(&mut self) -> &mut NeuralNetwork {
        self.nn
    }

    fn check_shape(&self, sample: &Sample) -> Result<()> {
        Error::check_len("sample input", self.nn.n_inputs(), sample.input().len())?;
        Error::check_len("sample target", self.nn.n_outputs(), sample.target().len())
    }

    /// Repeats forward and backward passes on one sample until its loss is at most
    /// `acceptable_error` or `MAX_SINGLE_SAMPLE_ITERATIONS` is reached.
    pub fn train_one(
        &mut self,
        sample: &Sample,
        acceptable_error: f64,
        parallelism: Parallelism,
    ) -> Result<TrainOneReport> {
        self.check_shape(sample)?;
        let mut iterations = 0usize;
        let mut loss = f64::MAX;
        while loss > acceptable_error && iterations < MAX_SINGLE_SAMPLE_ITERATIONS {
            self.nn.compute(sample.input(), parallelism)?;
            loss = self.nn.backpropagate(sample.target(), parallelism)?;
            iterations += 1;
        }
        let converged = loss <= acceptable_error;
        if converged {
            log::debug!("sample converged after {iterations} iteration(s), loss = {loss}");
        } else {
            log::warn!(
                "sample did not converge within {MAX_SINGLE_SAMPLE_ITERATIONS} iterations, loss = {loss}"
            );
        }
        Ok(TrainOneReport {
            iterations,
            loss,
            converged,
        })
    }

    /// Trains on every sample of `samples` once per epoch, in a freshly shuffled order, stopping
    /// early when an epoch's loss sum drops below `acceptable_error`.
    ///
    /// Returns the loss sum of the last epoch, or `NOT_TRAINED_LOSS` if `n_epochs` is zero.
    /// Every sample is checked against the network's shape before the first update.
    /// Samples are always trained one after another; `parallelism` only applies within a sample.
    pub fn train_on_dataset(
        &mut self,
        samples: &mut SampleSet,
        n_epochs: usize,
        acceptable_error: f64,
        parallelism: Parallelism,
    ) -> Result<f64> {
        for sample in samples.iter() {
            self.check_shape(sample)?;
        }
        let start = Instant::now();
        let mut loss_sum = NOT_TRAINED_LOSS;
        for epoch in 0..n_epochs {
            samples.shuffle(&mut self.rng);
            let mut epoch_loss_sum = 0.0f64;
            for sample in samples.iter() {
                self.nn.compute(sample.input(), parallelism)?;
                epoch_loss_sum += self.nn.backpropagate(sample.target(), parallelism)?;
            }
            loss_sum = epoch_loss_sum;
            let progress = EpochProgress {
                epoch,
                n_epochs,
                loss_sum,
                elapsed: start.elapsed(),
            };
            log::info!(
                "[{:.0}%] epoch {} L = {}",
                progress.fraction() * 100.0,
                epoch + 1,
                loss_sum
            );
            if let Some(on_progress) = self.on_progress.as_mut() {
                on_progress(&progress);
            }
            if loss_sum < acceptable_error {
                log::info!("reached loss {loss_sum} after {} epoch(s)", epoch + 1);
                break;
            }
        }
        log::info!(
            "trained {} sample(s) in {:?}, final L = {loss_sum}",
            samples.len(),
            start.elapsed()
        );
        Ok(loss_sum)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{Glyph, Topology};

    #[test]
    fn zero_epochs_leave_parameters_untouched() {
        let mut nn = NeuralNetwork::with_rng(
            Topology::new([2, 3, 2]).unwrap(),
            &mut StdRng::seed_from_u64(1),
        );
        let before = nn.params_as_slice().to_vec();
        let mut samples = SampleSet::from(vec![Sample::new([0.0, 1.0], 2, Glyph::A).unwrap()]);
        let mut calls = 0;
        let loss = Gym::with_rng(&mut nn, StdRng::seed_from_u64(2))
            .on_progress(|_| calls += 1)
            .train_on_dataset(&mut samples, 0, 0.01, Parallelism::Sequential)
            .unwrap();
        assert_eq!(loss, NOT_TRAINED_LOSS);
        assert_eq!(calls, 0);
        assert_eq!(nn.params_as_slice(), &before[..]);
    }

    #[test]
    fn progress_reported_every_epoch() {
        let mut nn = NeuralNetwork::with_rng(
            Topology::new([2, 2]).unwrap(),
            &mut StdRng::seed_from_u64(3),
        );
        let mut samples = SampleSet::from(vec![
            Sample::new([0.0, 1.0], 2, Glyph::A).unwrap(),
            Sample::new([1.0, 0.0], 2, Glyph::B).unwrap(),
        ]);
        let mut reports = Vec::new();
        let loss = Gym::with_rng(&mut nn, StdRng::seed_from_u64(4))
            .on_progress(|progress| reports.push(*progress))
            .train_on_dataset(&mut samples, 5, 0.0, Parallelism::Sequential)
            .unwrap();
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].fraction(), 0.0);
        assert_eq!(reports[4].fraction(), 0.8);
        assert_eq!(reports[4].loss_sum, loss);
    }

    #[test]
    fn malformed_sample_rejected_before_any_update() {
        let mut nn = NeuralNetwork::with_rng(
            Topology::new([2, 3, 2]).unwrap(),
            &mut StdRng::seed_from_u64(6),
        );
        let before = nn.params_as_slice().to_vec();
        for seed in 0..20 {
            let mut samples = SampleSet::from(vec![
                Sample::new([0.0, 1.0], 2, Glyph::A).unwrap(),
                Sample::new([1.0, 0.0], 2, Glyph::B).unwrap(),
                Sample::new([1.0, 0.5, 0.0], 2, Glyph::A).unwrap(),
            ]);
            let err = Gym::with_rng(&mut nn, StdRng::seed_from_u64(seed))
                .train_on_dataset(&mut samples, 3, 0.0, Parallelism::Sequential)
                .unwrap_err();
            assert!(matches!(
                err,
                Error::ShapeMismatch {
                    what: "sample input",
                    expected: 2,
                    actual: 3
                }
            ));
            assert_eq!(nn.params_as_slice(), &before[..]);
        }

        let wide_target = Sample::new([0.0, 1.0], 3, Glyph::W).unwrap();
        assert!(
            Gym::new(&mut nn)
                .train_one(&wide_target, 0.01, Parallelism::Sequential)
                .is_err()
        );
        assert_eq!(nn.params_as_slice(), &before[..]);
    }

    #[test]
    fn train_one_reports_cap() {
        let mut nn = NeuralNetwork::with_rng(
            Topology::new([2, 3, 2]).unwrap(),
            &mut StdRng::seed_from_u64(5),
        );
        let sample = Sample::new([0.3, 0.6], 2, Glyph::A).unwrap();
        // A sigmoid never reaches its asymptote, so a zero error cannot be met.
        let report = Gym::new(&mut nn)
            .train_one(&sample, 0.0, Parallelism::Sequential)
            .unwrap();
        assert_eq!(report.iterations, MAX_SINGLE_SAMPLE_ITERATIONS);
        assert!(!report.converged);
        assert!(report.loss > 0.0);
    }
}
