// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for stagehand

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Natural-language driven workflow scheduler for identified work items")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a description and execute the resulting workflow
    Run {
        #[arg(help = "Free-text workflow description")]
        description: Option<String>,

        #[arg(short, long, help = "Read the description from a file instead")]
        file: Option<PathBuf>,

        #[arg(long, help = "Dry run - print the simulated plan, spawn nothing")]
        dry_run: bool,

        #[arg(long, help = "Runner command invoked once per item")]
        runner: Option<String>,

        #[arg(short, long, help = "Write the JSON execution report to a file")]
        output: Option<PathBuf>,

        #[arg(short = 'y', long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Parse a description and print the plan confirmation without executing
    Plan {
        #[arg(help = "Free-text workflow description")]
        description: Option<String>,

        #[arg(short, long, help = "Read the description from a file instead")]
        file: Option<PathBuf>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
