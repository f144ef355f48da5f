//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Branching timelines of species: validate, order, lay out and edit lineage trees
#[derive(Parser, Debug)]
#[command(name = "phtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .phtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tree with its time intervals
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print species in display row order
    Order {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Hide species appearing at or after this time
        #[arg(long, allow_negative_numbers = true)]
        present_time: Option<f64>,
    },

    /// Print drawing coordinates for every row
    Layout {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        options: LayoutArgs,
    },

    /// Print tree statistics
    Stats {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Check that a document describes a valid tree
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Add a descendant below an existing species
    AddDescendant {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Name of the species to branch from
        parent: String,
        #[command(flatten)]
        species: NewSpeciesArgs,
        /// Time after the parent's apparition
        #[arg(long, allow_negative_numbers = true)]
        after: f64,
    },

    /// Add an ancestor above an existing species
    AddAncestor {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Name of the species receiving the ancestor
        child: String,
        #[command(flatten)]
        species: NewSpeciesArgs,
        /// Time between the ancestor's and the child's apparition
        #[arg(long, allow_negative_numbers = true)]
        before: f64,
    },

    /// Remove a species and its subtree
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        name: String,
    },

    /// Make a species the new root, dropping everything above and beside it
    Reroot {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        name: String,
    },

    /// Write the built-in sample tree
    Example {
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
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

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Scale by generations instead of time
    #[arg(long)]
    pub steps: bool,
    #[arg(long)]
    pub width: Option<f64>,
    #[arg(long)]
    pub row_height: Option<f64>,
    /// Hide species appearing at or after this time
    #[arg(long, allow_negative_numbers = true)]
    pub present_time: Option<f64>,
}

#[derive(Args, Debug)]
pub struct NewSpeciesArgs {
    /// Name of the new species
    pub name: String,
    #[arg(long)]
    pub duration: f64,
    #[arg(long)]
    pub description: Option<String>,
    /// Image URL
    #[arg(long, value_hint = ValueHint::Url)]
    pub image: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
