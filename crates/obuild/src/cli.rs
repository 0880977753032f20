//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "obuild", version, about = "Parallel build driver scripted by an embedded command language")]
pub struct Cli {
    /// Change to DIR before doing anything else
    #[arg(short = 'C', value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Build file to run
    #[arg(short = 'f', value_name = "FILE", default_value = "obuild.cfg")]
    pub file: PathBuf,

    /// Evaluate STR before running the build file
    #[arg(short = 'e', value_name = "STR")]
    pub eval: Option<String>,

    /// Number of jobs; 0 means the number of CPU cores
    #[arg(short = 'j', value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Ignore environment variables: getenv always returns its default
    #[arg(short = 'E')]
    pub ignore_env: bool,

    /// Target or action to build
    #[arg(default_value = "default")]
    pub target: String,
}
