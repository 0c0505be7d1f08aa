pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "party-dl")]
#[command(about = "Download every post of a creator from a coomer-style site", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download all files of a creator
    #[command(alias = "d")]
    Download {
        /// Profile URL of the creator
        url: String,
        /// Directory the creator folder is created in
        #[arg(short, long)]
        base_location: Option<PathBuf>,
        /// Number of posts downloaded concurrently
        #[arg(short, long)]
        threads: Option<usize>,
    },
    /// Push downloaded metadata into a Stash instance
    #[command(alias = "s")]
    Stash {
        /// Base URL of the Stash instance
        #[arg(long)]
        stash_host: Option<String>,
        /// Directory holding the creator folders
        #[arg(short, long)]
        content: PathBuf,
    },
}
