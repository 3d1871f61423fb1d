use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use sgdnet::{Error, Gym, NeuralNetwork, Parallelism, SampleSet, Topology};

#[derive(Parser, Debug)]
#[command(version, about = "Train and run a sigmoid MLP glyph classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a network on a sample file and save it.
    Train {
        /// Layer widths, e.g. `2;3;2`.
        #[arg(long)]
        topology: Topology,
        /// One sample per line: `<glyph> v1 v2 ...`.
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 1000)]
        epochs: usize,
        /// Stop once an epoch's summed loss drops below this.
        #[arg(long, default_value_t = 0.01)]
        acceptable_error: f64,
        /// Fan the per-neuron loops of every layer out over all cores.
        #[arg(long)]
        parallel: bool,
        #[arg(long, default_value = "model.txt")]
        model: PathBuf,
        /// Start from the parameters in `--model` if that file exists.
        #[arg(long)]
        warm_start: bool,
        /// Seed for initialization and shuffling.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Classify every sample of a file and report the accuracy on the labelled ones.
    Predict {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        parallel: bool,
    },
    /// Print the parameters of a saved model.
    Inspect {
        #[arg(long)]
        model: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Cli::parse().command {
        Command::Train {
            topology,
            data,
            epochs,
            acceptable_error,
            parallel,
            model,
            warm_start,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let mut samples =
                SampleSet::read_from(&data, topology.n_inputs(), topology.n_outputs())
                    .with_context(|| format!("reading samples from {}", data.display()))?;
            if samples.is_empty() {
                bail!("{} contains no samples", data.display());
            }
            let mut nn = NeuralNetwork::with_rng(topology, &mut rng);
            if warm_start {
                match nn.load(&model) {
                    Ok(()) => {}
                    Err(Error::ModelNotFound(path)) => {
                        log::info!("no model at {}, training from scratch", path.display());
                    }
                    Err(e) => {
                        return Err(e)
                            .with_context(|| format!("warm start from {}", model.display()));
                    }
                }
            }
            let parallelism = Parallelism::from(parallel);
            let loss = Gym::with_rng(&mut nn, rng)
                .train_on_dataset(&mut samples, epochs, acceptable_error, parallelism)?;
            let accuracy = samples.accuracy(&mut nn, parallelism)?;
            println!("loss = {loss}, accuracy = {:.2}%", accuracy * 100.0);
            nn.save(&model)
                .with_context(|| format!("saving model to {}", model.display()))?;
        }
        Command::Predict {
            model,
            data,
            parallel,
        } => {
            let mut nn = NeuralNetwork::from_file(&model)
                .with_context(|| format!("loading model from {}", model.display()))?;
            let mut samples = SampleSet::read_from(&data, nn.n_inputs(), nn.n_outputs())
                .with_context(|| format!("reading samples from {}", data.display()))?;
            let parallelism = Parallelism::from(parallel);
            let mut n_labelled = 0usize;
            let mut n_correct = 0usize;
            for (i, sample) in samples.iter_mut().enumerate() {
                let glyph = nn.predict(sample, parallelism)?;
                println!("[i = {i}] {glyph} {:?}", sample.output());
                if sample.actual().is_known() {
                    n_labelled += 1;
                    n_correct += usize::from(sample.is_correct());
                }
            }
            if n_labelled != 0 {
                println!("accuracy = {n_correct}/{n_labelled}");
            }
        }
        Command::Inspect { model } => {
            let nn = NeuralNetwork::from_file(&model)
                .with_context(|| format!("loading model from {}", model.display()))?;
            println!("topology: {}", nn.topology());
            for i_layer in 0..nn.params().n_layers() {
                println!(
                    "=== Layer #{i_layer} ===\n\n{}\n",
                    nn.params().pretty_print_layer(i_layer).unwrap(),
                );
            }
        }
    }
    Ok(())
}
