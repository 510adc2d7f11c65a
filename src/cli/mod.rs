pub mod research;
pub mod schema;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "techscout")]
#[command(
    author,
    version,
    about = "Research a technology topic across multiple LLM providers and get one unified report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one research request across all configured providers
    Research(ResearchArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct ResearchArgs {
    /// Topic to research
    pub topic: String,

    /// Path to config file (built-in defaults are used when absent)
    #[arg(short, long, default_value = "techscout.yaml")]
    pub config: PathBuf,

    /// Write the rendered report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override synthesis mode (llm or assembly)
    #[arg(long)]
    pub synthesis: Option<String>,

    /// Suppress per-provider progress lines
    #[arg(short, long)]
    pub quiet: bool,
}
