use std::time::{Duration, Instant};

use sgdnet::{Glyph, Gym, NeuralNetwork, Parallelism, Sample, SampleSet, Topology};

fn time<T>(f: impl FnOnce() -> T) -> (Duration, T) {
    let before = Instant::now();
    let result = f();
    let after = Instant::now();
    (after.duration_since(before), result)
}

fn main() -> sgdnet::Result<()> {
    env_logger::init();

    let mut samples = SampleSet::new();
    for (input, glyph) in [
        ([0.0, 0.1, 0.0, 0.2], Glyph::A),
        ([0.1, 0.0, 0.2, 0.1], Glyph::A),
        ([0.2, 0.1, 0.1, 0.0], Glyph::A),
        ([0.9, 1.0, 0.8, 0.9], Glyph::B),
        ([1.0, 0.8, 0.9, 1.0], Glyph::B),
        ([0.8, 0.9, 1.0, 0.9], Glyph::B),
        ([0.1, 0.9, 0.1, 0.9], Glyph::W),
        ([0.0, 1.0, 0.2, 0.8], Glyph::W),
        ([0.2, 0.8, 0.0, 1.0], Glyph::W),
    ] {
        samples.push(Sample::new(input, 3, glyph)?);
    }

    let mut nn = NeuralNetwork::new(Topology::new([4, 16, 16, 3])?);

    let n_epochs = 5_000;
    let n_logs = 10;
    let single_thread = std::env::args().any(|arg| arg == "--single-thread");
    let parallelism = Parallelism::from(!single_thread);

    let (training_duration, loss) = time(|| {
        Gym::new(&mut nn)
            .on_progress(|progress| {
                if progress.epoch % (n_epochs / n_logs) == 0 {
                    println!(
                        "[{:.0}%] L = {}",
                        progress.fraction() * 100.0,
                        progress.loss_sum
                    );
                }
            })
            .train_on_dataset(&mut samples, n_epochs, 1e-3, parallelism)
    });
    let loss = loss?;
    println!("training took {training_duration:?}, L = {loss}");

    let accuracy = samples.accuracy(&mut nn, parallelism)?;
    println!("accuracy = {:.0}%", accuracy * 100.0);
    for sample in samples.iter() {
        println!(
            "expected: {} => result: {} {:?}",
            sample.actual(),
            sample.recognized(),
            sample.output()
        );
    }
    Ok(())
}
