use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "markday")]
#[command(about = "Keep a Markdown diary with weather notes and moments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the database and moment files
    /// (default: $MARKDAY_HOME or ~/.markday)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Use throwaway in-memory storage instead of the data directory
    #[arg(long, global = true)]
    pub in_memory: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new diary entry
    #[command(alias = "new")]
    Add {
        /// Entry title
        #[arg(short, long)]
        title: String,
        /// Day the entry is filed under (YYYY-MM-DD, defaults to today)
        #[arg(short, long, value_name = "DATE")]
        date: Option<String>,
        /// Markdown content (read from stdin when omitted)
        content: Vec<String>,
    },
    /// List diary entries, newest day first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one diary entry
    Show {
        /// Entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing diary entry
    Edit {
        /// Entry ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New Markdown content
        #[arg(short, long)]
        content: Option<String>,
        /// New day (YYYY-MM-DD)
        #[arg(short, long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Delete one or more diary entries
    Delete {
        /// Entry IDs
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Look up weather and attach it to entries
    Weather {
        /// Use the offline mock client instead of the Google Weather API
        #[arg(long, global = true)]
        mock: bool,
        #[command(subcommand)]
        command: WeatherCommands,
    },
    /// Manage moments (media files with tags)
    Moments {
        #[command(subcommand)]
        command: MomentCommands,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Back up the diary to Google Drive
    Drive {
        #[command(subcommand)]
        command: DriveCommands,
    },
    /// Export diary entries
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
pub enum WeatherCommands {
    /// Show current conditions at a location
    Current {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Fill an entry's weather from the hourly history of its day
    Annotate {
        /// Entry ID
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

#[derive(Subcommand)]
pub enum MomentCommands {
    /// Store a file as a moment
    Add {
        /// File to import
        path: PathBuf,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// List stored moments
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a moment's bytes to a file
    Get {
        /// Moment ID
        id: i64,
        /// Destination path
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },
    /// Delete a moment and its bytes
    Delete {
        /// Moment ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show storage locations and settings
    Show,
    /// Store the Google Weather API key
    SetWeatherKey {
        /// API key
        key: String,
    },
    /// Remove the stored Google Weather API key
    ClearWeatherKey,
}

#[derive(Subcommand)]
pub enum DriveCommands {
    /// Show the signed-in account
    Status,
    /// Store an OAuth access token and check it against the API
    SignIn {
        /// Access token (default: $MARKDAY_DRIVE_TOKEN)
        token: Option<String>,
    },
    /// Forget the stored access token
    SignOut,
    /// Upload all entries as a JSON backup
    Backup,
}
