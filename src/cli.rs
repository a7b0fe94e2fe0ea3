// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use regprune::config::{BackendKind, Overrides};
use regprune::types::{RepositoryName, TagPrefixes};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regprune")]
#[command(about = "Retire stale container images while keeping the newest of every release track")]
#[command(version)]
pub struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final summary
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: regprune.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter regprune.yml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// AWS region to put in the template
        #[arg(long)]
        region: Option<String>,

        /// Retention window in days
        #[arg(long)]
        retention_days: Option<u32>,

        /// Comma-separated tag prefixes
        #[arg(long)]
        tag_prefixes: Option<TagPrefixes>,
    },

    /// Delete images that fall outside the retention policy
    Clean(CleanArgs),

    /// List repositories and how many images each holds
    Repos(BackendArgs),
}

#[derive(Args, Debug, Default)]
pub struct BackendArgs {
    /// Registry backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// AWS region (ecr backend)
    #[arg(long)]
    pub region: Option<String>,

    /// Inventory JSON file (snapshot backend)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Days to retain images
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// Comma-separated list of tag prefixes, one track each
    #[arg(long)]
    pub tag_prefixes: Option<TagPrefixes>,

    /// Most recent images each track keeps regardless of age
    #[arg(long)]
    pub keep_per_track: Option<usize>,

    /// Simulate changes without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Only sweep this repository (repeatable)
    #[arg(long = "repository", value_name = "NAME")]
    pub repositories: Vec<RepositoryName>,

    /// Repositories processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Append the run log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl BackendArgs {
    pub fn overrides(self) -> Overrides {
        Overrides {
            region: self.region,
            backend: self.backend,
            snapshot: self.snapshot,
            ..Default::default()
        }
    }
}

impl CleanArgs {
    pub fn overrides(self) -> Overrides {
        Overrides {
            retention_days: self.retention_days,
            tag_prefixes: self.tag_prefixes,
            keep_per_track: self.keep_per_track,
            repositories: self.repositories,
            concurrency: self.concurrency,
            dry_run: self.dry_run,
            log_file: self.log_file,
            ..self.backend.overrides()
        }
    }
}
