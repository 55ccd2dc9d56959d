use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "wsl-reclaim")]
#[command(about = "Reclaim host disk space from WSL virtual disk images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Shut down WSL and compact every discovered disk image
    Compact(CompactArgs),
    /// List discovered disk images without touching them
    List,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct CompactArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}
