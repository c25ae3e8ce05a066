use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taskboard",
    about = "Manage the task board's saved state, images, and archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the default board if none is saved
    Init,
    /// Print the saved board
    Show,
    /// List cards with deadlines and their countdowns
    Deadlines,
    /// Write the board and its images to an archive
    Export(ExportArgs),
    /// Replace the board with the contents of an archive
    Import(ImportArgs),
    /// Attach an image file to a card
    Attach(AttachArgs),
    /// Delete images no card references
    Prune,
    /// Delete the saved board and all images stored in the database
    Reset(ResetArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination archive path
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Archive to import
    pub path: PathBuf,
}

#[derive(Args)]
pub struct AttachArgs {
    /// Card to attach the image to
    pub card_id: String,
    /// Image file; stored as-is
    pub image: PathBuf,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm deleting the saved board
    #[arg(long)]
    pub yes: bool,
}
