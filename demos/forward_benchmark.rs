use std::{
    io::{Write, stdout},
    time::Instant,
};

use sgdnet::{NeuralNetwork, Parallelism, Topology};

fn main() -> sgdnet::Result<()> {
    let n_times = 2_000u32;
    // The input width of a 64x32 glyph bitmap.
    let topology = Topology::new([2048, 512, 128, 10])?;
    let input = vec![0.5; topology.n_inputs()];
    let mut nn = NeuralNetwork::new(topology);

    println!("Test neural network: {}, sigmoid activation", nn.topology());
    println!("Forward function {n_times} times, {} cores", num_cpus::get());

    for parallelism in [Parallelism::Sequential, Parallelism::Rayon] {
        print!("benchmarking {parallelism:?} ...");
        stdout().flush().unwrap();
        let before = Instant::now();
        for i in 0..n_times {
            if i % (n_times / n_times.min(10)) == 0 || i == n_times - 1 {
                let percentage = (i as f32) / (n_times as f32) * 100.0;
                print!(" {percentage:.0}%");
                stdout().flush().unwrap();
            }
            std::hint::black_box(nn.compute(&input, parallelism)?);
        }
        let after = Instant::now();
        let time = after.duration_since(before);
        let time_per_forward = time / n_times;
        println!(" ... {time:.4?} total, {time_per_forward:.0?} per forward");
    }
    Ok(())
}
