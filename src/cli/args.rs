//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Rebuild nested PDF bookmarks from section numbers, export and import them as text
#[derive(Parser, Debug)]
#[command(name = "pdfmarks")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    /// Keep whitespace around bookmark titles
    #[arg(long, global = true)]
    pub no_strip: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild every document in a directory into <stem><suffix>.pdf
    Batch {
        /// Directory to scan (default: input_dir setting)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Nest the bookmarks of one document by their section numbers
    Rebuild {
        /// Source document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Output document (default: <stem><suffix>.pdf next to the source)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Write the inferred outline as tab-indented text
    Export {
        /// Source document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Text file, `-` for stdout (default: <stem>.txt next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply an outline from a tab-indented text file
    Import {
        /// Source document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Bookmark text file
        #[arg(value_hint = ValueHint::FilePath)]
        bookmarks: PathBuf,
        /// Output document (default: <stem><suffix>.pdf next to the source)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show the inferred outline as tree
    Show {
        /// Source document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Print the text encoding instead of a tree
        #[arg(long)]
        text: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
