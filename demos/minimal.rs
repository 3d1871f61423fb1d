use sgdnet::{Glyph, Gym, NeuralNetwork, Parallelism, Sample, Topology};

fn main() -> sgdnet::Result<()> {
    // One sample, two classes: overfit a [2, 3, 2] network to recognise it as `A`.
    let sample = Sample::new([0.2, 0.9], 2, Glyph::A)?;

    let mut nn = NeuralNetwork::new(Topology::new([2, 3, 2])?);

    let report = Gym::new(&mut nn).train_one(&sample, 0.01, Parallelism::Sequential)?;

    println!(
        "iterations = {}, loss = {}, converged = {}",
        report.iterations, report.loss, report.converged
    );

    let mut sample = sample;
    let glyph = nn.predict(&mut sample, Parallelism::Sequential)?;
    println!("[Result] {glyph} {:?}", sample.output());
    Ok(())
}
