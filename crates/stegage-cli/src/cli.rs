use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use stegage_core::VERSION;

/// Stegage - hide age-encrypted files inside images
#[derive(Parser)]
#[command(name = "stegage")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "STEGAGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (no spinner or status output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file and hide it inside an image
    #[command(visible_alias = "e")]
    Encode(EncodeArgs),

    /// Recover and decrypt a file hidden inside an image
    #[command(visible_alias = "d")]
    Decode(DecodeArgs),

    /// Show how many bytes an image can hide
    Capacity(CapacityArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Arguments for the `encode` command
#[derive(Args)]
pub struct EncodeArgs {
    /// File to hide (reads stdin if omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Cover image (PNG, BMP or JPEG)
    #[arg(short, long, value_name = "IMAGE")]
    pub inside: PathBuf,

    /// Where to write the PNG result (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// scrypt work factor (log2 N) for this encryption
    #[arg(short, long, value_name = "N")]
    pub work_factor: Option<u8>,
}

/// Arguments for the `decode` command
#[derive(Args)]
pub struct DecodeArgs {
    /// Image holding the hidden file (reads stdin if omitted)
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Where to write the recovered file (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `capacity` command
#[derive(Args)]
pub struct CapacityArgs {
    /// Cover image to measure
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,
}
