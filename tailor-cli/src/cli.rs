use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Record and look up client body measurements")]
pub struct Cli {
    /// Path to the storage file (overrides TAILOR_DATA_PATH and the settings file)
    #[clap(long, global = true)]
    pub data: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

/// Field values shared by `add` and `edit`
#[derive(clap::Args, Debug, Default)]
pub struct RecordArgs {
    /// Client name
    #[clap(long)]
    pub name: Option<String>,

    /// Client phone number (at least 11 digits)
    #[clap(long)]
    pub phone: Option<String>,

    /// Free-form comments
    #[clap(long)]
    pub comments: Option<String>,

    /// Measurement as key=value, e.g. --set chest=38 (repeatable)
    #[clap(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub measurements: Vec<String>,
}

impl RecordArgs {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.comments.is_none()
            && self.measurements.is_empty()
    }
}

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// Fetch the application shell into the cache bucket
    Install,

    /// Serve one asset cache-first and report where it came from
    Fetch {
        /// Asset path, e.g. /styles.css
        path: String,

        /// Write the body to this file
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List cache buckets and the paths cached in the active one
    List,

    /// Delete a cache bucket (defaults to the active bucket)
    Delete {
        /// Bucket name
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective settings
    Show,

    /// Set the storage file used when no --data flag is given
    SetDataPath { path: PathBuf },

    /// Set the base URL shell assets are fetched from
    SetOrigin { url: String },

    /// Set the active cache bucket name
    SetBucket { name: String },

    /// Clear the form before loading a record for editing (true/false)
    ClearFormOnEdit {
        #[clap(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record measurements for a new client
    Add {
        #[clap(flatten)]
        record: RecordArgs,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// List clients, most recent first
    List {
        /// Only show clients whose name contains this text
        #[clap(long)]
        search: Option<String>,
    },

    /// Show every measurement of one client
    Show {
        /// Position in the list (0 = most recent)
        index: usize,
    },

    /// Edit the client at a list position
    Edit {
        /// Position in the list (0 = most recent)
        index: usize,

        #[clap(flatten)]
        record: RecordArgs,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Delete the client at a list position
    #[clap(alias = "del")]
    Delete {
        /// Position in the list (0 = most recent)
        index: usize,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Search clients by name (case-insensitive)
    Search { query: String },

    /// Export every record
    Export {
        /// Export format (json, markdown)
        #[clap(long, short = 'f', default_value = "json")]
        format: String,

        /// Output file (prints to stdout if omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Remove every record
    Reset {
        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Offline asset cache
    #[clap(subcommand)]
    Assets(AssetsCommand),

    /// Settings
    #[clap(subcommand)]
    Config(ConfigCommand),
}
