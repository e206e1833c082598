use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use scriptlens_core::DEFAULT_CRITERIA_FILE;
use scriptlens_runtime::ExecutionMode;

#[derive(Parser, Debug)]
#[command(
    name = "scriptlens",
    version,
    about = "Review video scripts against editorial criteria with an LLM"
)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a script file against the criteria file
    Analyze(AnalyzeArgs),
    /// List the criteria parsed from a criteria file
    Criteria(CriteriaArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Script text file
    pub script: PathBuf,

    #[arg(long, default_value = DEFAULT_CRITERIA_FILE)]
    pub criteria: PathBuf,

    /// Model id (overrides SCRIPTLENS_MODEL and the config file)
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Analyze only these criteria, by 1-based position (e.g. 1,3)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<usize>,

    /// Part size in characters
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// YAML runtime configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the text report
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write the request log as JSON
    #[arg(long)]
    pub log_json: Option<PathBuf>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct CriteriaArgs {
    #[arg(default_value = DEFAULT_CRITERIA_FILE)]
    pub file: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Sequential,
    Concurrent,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => ExecutionMode::Sequential,
            ModeArg::Concurrent => ExecutionMode::Concurrent,
        }
    }
}
