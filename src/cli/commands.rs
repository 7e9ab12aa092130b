// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `sample` and
// `reconstruct`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the VAE on a folder of class sub-directories
    Train(TrainArgs),

    /// Generate new images from a trained checkpoint
    Sample(SampleArgs),

    /// Reconstruct existing images with a trained checkpoint
    Reconstruct(ReconstructArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root directory; each sub-directory is one class of images
    #[arg(long, default_value = "data/images")]
    pub data_dir: String,

    /// Where checkpoints, images and the loss history are written
    #[arg(long, default_value = "runs/vae")]
    pub output_dir: String,

    /// Number of full passes through the training data (0 is allowed)
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Latent dimensionality Z
    #[arg(long, default_value_t = 20)]
    pub latent_dim: usize,

    /// Hidden width H1 of encoder and decoder
    #[arg(long, default_value_t = 400)]
    pub hidden_width: usize,

    /// 1 = grayscale, 3 = RGB
    #[arg(long, default_value_t = 1)]
    pub channels: usize,

    /// Images are resized to height × width
    #[arg(long, default_value_t = 28)]
    pub height: usize,

    #[arg(long, default_value_t = 28)]
    pub width: usize,

    /// Save weights every N epochs
    #[arg(long, default_value_t = 5)]
    pub checkpoint_interval: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Weight of the KL term (1.0 = standard VAE)
    #[arg(long, default_value_t = 1.0)]
    pub beta: f64,

    /// Share of class folders held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Prior samples decoded after every epoch
    #[arg(long, default_value_t = 64)]
    pub sample_count: usize,

    /// Validation images compared with their reconstructions after every epoch
    #[arg(long, default_value_t = 8)]
    pub comparison_count: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:            a.data_dir,
            output_dir:          a.output_dir,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            latent_dim:          a.latent_dim,
            hidden_width:        a.hidden_width,
            channels:            a.channels,
            height:              a.height,
            width:               a.width,
            checkpoint_interval: a.checkpoint_interval,
            learning_rate:       a.lr,
            random_seed:         a.seed,
            beta:                a.beta,
            val_fraction:        a.val_fraction,
            sample_count:        a.sample_count,
            comparison_count:    a.comparison_count,
        }
    }
}

/// All arguments for the `sample` command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Output directory of the training run
    #[arg(long, default_value = "runs/vae")]
    pub output_dir: String,

    /// Checkpoint epoch to load (latest when omitted)
    #[arg(long)]
    pub epoch: Option<usize>,

    #[arg(long, default_value_t = 64)]
    pub count: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// File name inside <output_dir>/images
    #[arg(long, default_value = "generated.png")]
    pub file_name: String,
}

/// All arguments for the `reconstruct` command
#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// Folder tree of images to reconstruct
    #[arg(long)]
    pub input_dir: String,

    #[arg(long, default_value = "runs/vae")]
    pub output_dir: String,

    #[arg(long)]
    pub epoch: Option<usize>,

    /// At most this many images are reconstructed
    #[arg(long, default_value_t = 8)]
    pub count: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, default_value = "reconstructed.png")]
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_args_become_config() {
        let cli = Cli::try_parse_from([
            "image-vae", "train", "--epochs", "3", "--latent-dim", "4", "--beta", "0.5",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.latent_dim, 4);
        assert_eq!(cfg.beta, 0.5);
        assert_eq!(cfg.comparison_count, 8);
    }

    #[test]
    fn test_reconstruct_requires_input_dir() {
        assert!(Cli::try_parse_from(["image-vae", "reconstruct"]).is_err());
    }
}
