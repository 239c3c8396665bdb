use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "localfiles")]
#[command(author, version, about = "Local asset registry and display target rotation")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the rotation scheduler until interrupted
    Run,

    /// Index files under the content root
    Scan {
        /// Only scan this directory below the content root
        #[arg(long)]
        subdir: Option<PathBuf>,

        /// Re-ingest files that are already indexed
        #[arg(long)]
        force: bool,
    },

    /// List indexed files
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a URL into the content root and index it
    Fetch {
        url: String,

        /// Store under this directory instead of the content root
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show the full record of a file (key or name)
    Info {
        #[arg(value_name = "REF")]
        asset: String,
    },

    /// Delete a file from disk and from the index
    Delete {
        #[arg(value_name = "REF")]
        asset: String,
    },

    /// Rename a file in place
    Rename {
        #[arg(value_name = "REF")]
        asset: String,
        new_name: String,
    },

    /// Tag a file with a category (empty string clears it)
    Category {
        #[arg(value_name = "REF")]
        asset: String,
        category: String,
    },

    /// Attach a description to a file (empty string clears it)
    DescribeFile {
        #[arg(value_name = "REF")]
        asset: String,
        text: String,
    },

    /// Write the raw bytes of a file to stdout or a file
    Content {
        #[arg(value_name = "REF")]
        asset: String,

        /// Write to this path instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage scheduled targets
    #[command(subcommand)]
    Target(TargetCommand),

    /// Probe a file and display its metadata
    Probe {
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Write a config file with every default filled in
    InitConfig {
        #[arg(default_value = "./localfiles.toml")]
        path: PathBuf,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum TargetCommand {
    /// Start scheduling a target with default settings
    Register { target: u64 },

    /// Stop scheduling a target
    Deregister { target: u64 },

    /// Rotate through every file tagged with a category
    Category { target: u64, category: String },

    /// Append a file name or URL to the target's list
    AddUrl { target: u64, url: String },

    /// Remove every occurrence of an entry from the list
    RemoveUrl { target: u64, url: String },

    /// Set how many ticks pass between rotations
    Interval { target: u64, ticks: u32 },

    /// Resume rotation
    Enable { target: u64 },

    /// Pause rotation
    Disable { target: u64 },

    /// Flip between enabled and disabled
    Toggle { target: u64 },

    /// Show a target's schedule
    Describe { target: u64 },

    /// List all scheduled targets
    List,
}
