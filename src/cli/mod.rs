// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`       — trains the VAE on a folder of images
//   2. `sample`      — decodes prior draws from a checkpoint
//   3. `reconstruct` — encodes and decodes existing images
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ReconstructArgs, SampleArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "image-vae",
    version = "0.1.0",
    about = "Train a variational autoencoder on a folder of images, then sample or reconstruct."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)       => run_train(args),
            Commands::Sample(args)      => run_sample(args),
            Commands::Reconstruct(args) => run_reconstruct(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on images in: {}", args.data_dir);

    let use_case = TrainUseCase::new(args.into());
    let history  = use_case.execute()?;

    if history.is_empty() {
        println!("Training complete. No epochs were run.");
        return Ok(());
    }
    match history.best_epoch() {
        Some(best) => println!(
            "Training complete after {} epochs. Best val_loss={:.4} at epoch {}.",
            history.completed_epochs(), history.val()[best - 1], best
        ),
        None => println!("Training complete. Validation loss was never finite."),
    }
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let path = SampleUseCase::new(args.output_dir, args.epoch)
        .execute(args.count, args.seed, &args.file_name)?;
    println!("Samples written to {}", path.display());
    Ok(())
}

fn run_reconstruct(args: ReconstructArgs) -> Result<()> {
    use crate::application::reconstruct_use_case::ReconstructUseCase;

    let path = ReconstructUseCase::new(args.output_dir, args.epoch)
        .execute(&args.input_dir, args.count, args.seed, &args.file_name)?;
    println!("Reconstructions written to {}", path.display());
    Ok(())
}
