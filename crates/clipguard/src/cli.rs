use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipguard")]
#[command(author, version, about = "Encrypted dashcam video intake and anonymization")]
pub struct Cli {
    /// Path to config file (defaults to ~/.clipguard/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one encrypted upload through a processing chain and wait for the result
    Process {
        /// Account the video belongs to
        #[arg(long)]
        account: i64,

        /// Chain classification: empty, simple, normal or extended
        #[arg(long, default_value = "normal")]
        chain: String,

        /// Video name, unique per account
        #[arg(long)]
        name: String,

        /// Encrypted video file
        #[arg(long)]
        video: PathBuf,

        /// Encrypted metadata file
        #[arg(long)]
        metadata: PathBuf,

        /// File holding the symmetric key (32 raw bytes or 64 hex chars)
        #[arg(long)]
        key: PathBuf,
    },

    /// List catalog entries of an account
    List {
        #[arg(long)]
        account: i64,
    },

    /// Show a catalog entry with its stored metadata
    Info {
        /// Catalog id of the video
        #[arg(long)]
        id: i64,
    },

    /// Delete a catalog entry and its stored files
    Delete {
        /// Catalog id of the video
        #[arg(long)]
        id: i64,
    },

    /// Print a freshly generated hex key
    Keygen,

    /// Encrypt a file the way capturing devices do before upload
    Encrypt {
        /// Hex-encoded 32-byte key
        #[arg(long)]
        key: String,

        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
}
