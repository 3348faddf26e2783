use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vrt_core::Framework;

#[derive(Parser)]
#[command(name = "vrt")]
#[command(about = "Branch-aware visual regression testing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Capture framework (default from vrt.toml: playwright)
    #[arg(long, global = true, env = "VRT_FRAMEWORK")]
    pub framework: Option<Framework>,

    /// Branch to use instead of the one Git reports
    #[arg(long, global = true, env = "VRT_BRANCH")]
    pub branch: Option<String>,

    /// Path to vrt.toml (default: searched upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Diff threshold in [0, 1] (default from vrt.toml: 0.1)
    #[arg(long, global = true, env = "VRT_THRESHOLD")]
    pub threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create vrt.toml in the current directory
    Init,

    /// Store a screenshot as baseline or comparison candidate
    Capture {
        /// Screenshot name, may contain '/' to nest
        name: String,

        /// PNG file to store
        image: PathBuf,
    },

    /// Diff this branch's captures and write the report
    Compare {
        /// Forget this branch's captures afterwards
        #[arg(long)]
        reset: bool,

        /// Also list tests that passed without a decision
        #[arg(long)]
        all: bool,
    },

    /// Accept captures as the new baselines
    Approve {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Reject captures, keeping the current baselines
    Reject {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show recorded approval decisions, newest first
    History,

    /// Restore baselines and approvals recorded for a commit
    Revert {
        /// Short SHA as shown by `vrt history`
        short_sha: String,
    },
}
