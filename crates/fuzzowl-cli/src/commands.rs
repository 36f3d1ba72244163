//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuzzowl_dl::query::{BnpQuery, KbSatisfiableQuery};
use fuzzowl_dl::{Document, FuzzyNumber, KnowledgeBase, Query, ReasonerConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "fuzzowl")]
#[command(about = "Fuzzy description logic reasoner compiling queries to mixed-integer programs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the queries of a knowledge base document
    Run {
        /// Knowledge base document (JSON)
        file: PathBuf,

        /// Reasoner configuration (JSON), replacing the document's
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check whether a knowledge base is consistent
    Check {
        /// Knowledge base document (JSON)
        file: PathBuf,

        /// Reasoner configuration (JSON), replacing the document's
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Classify the concept names of a knowledge base
    Classify {
        /// Knowledge base document (JSON)
        file: PathBuf,

        /// Reasoner configuration (JSON), replacing the document's
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Best non-fuzzy performance of the triangular fuzzy number (a, b, c)
    Bnp {
        #[arg(allow_negative_numbers = true)]
        a: f64,
        #[arg(allow_negative_numbers = true)]
        b: f64,
        #[arg(allow_negative_numbers = true)]
        c: f64,
    },

    /// Show system information
    Info,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Execute CLI commands
#[derive(Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a CLI command
    pub fn execute(&self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Run { file, config, format } => self.execute_run(&file, config.as_deref(), format),
            Commands::Check { file, config } => self.execute_check(&file, config.as_deref()),
            Commands::Classify { file, config, format } => self.execute_classify(&file, config.as_deref(), format),
            Commands::Bnp { a, b, c } => self.execute_bnp(a, b, c),
            Commands::Info => self.execute_info(),
        }
    }

    fn execute_run(&self, file: &Path, config: Option<&Path>, format: OutputFormat) -> Result<CommandResult> {
        let document = load_document(file, config)?;
        let results = document.run()?;
        info!("answered {} queries from {}", results.len(), file.display());

        let data = serde_json::to_value(&results)?;
        let message = match format {
            OutputFormat::Text => results
                .iter()
                .map(|r| format!("{} = {}", r.query, r.solution))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Json => serde_json::to_string(&data)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&data)?,
        };
        Ok(CommandResult {
            success: true,
            message,
            data: Some(data),
        })
    }

    fn execute_check(&self, file: &Path, config: Option<&Path>) -> Result<CommandResult> {
        let kb = load_document(file, config)?.build_kb()?;
        let solution = KbSatisfiableQuery::new().solve(&kb)?;
        let consistent = solution.is_consistent_kb();
        Ok(CommandResult {
            success: consistent,
            message: if consistent {
                "Consistent KB".to_string()
            } else {
                solution.to_string()
            },
            data: Some(serde_json::json!({ "consistent": consistent })),
        })
    }

    fn execute_classify(&self, file: &Path, config: Option<&Path>, format: OutputFormat) -> Result<CommandResult> {
        let mut kb: KnowledgeBase = load_document(file, config)?.build_kb()?;
        if !kb.is_consistent()? {
            return Ok(CommandResult {
                success: false,
                message: "Inconsistent KB".to_string(),
                data: None,
            });
        }
        let graph = kb.classify()?;
        let data = serde_json::to_value(graph)?;
        let message = match format {
            OutputFormat::Text => graph.to_string().trim_end().to_string(),
            OutputFormat::Json => serde_json::to_string(&data)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&data)?,
        };
        Ok(CommandResult {
            success: true,
            message,
            data: Some(data),
        })
    }

    fn execute_bnp(&self, a: f64, b: f64, c: f64) -> Result<CommandResult> {
        let number = FuzzyNumber::new(a, b, c)?;
        let solution = BnpQuery::new(number).solve(&KnowledgeBase::default())?;
        Ok(CommandResult {
            success: true,
            message: solution.to_string(),
            data: Some(serde_json::json!({ "bnp": solution.value() })),
        })
    }

    fn execute_info(&self) -> Result<CommandResult> {
        let config = ReasonerConfig::default();
        let message = format!(
            "fuzzowl {}\nsemantics: Classical, Zadeh (default), Lukasiewicz\nblocking: {:?} (default)\nprecision: {} digits",
            env!("CARGO_PKG_VERSION"),
            config.blocking,
            config.precision
        );
        Ok(CommandResult {
            success: true,
            message,
            data: None,
        })
    }
}

/// Read a document and apply an optional configuration file
pub fn load_document(file: &Path, config: Option<&Path>) -> Result<Document> {
    let text = std::fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let document = Document::from_json(&text).with_context(|| format!("cannot load {}", file.display()))?;
    match config {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
            Ok(document.with_config(ReasonerConfig::from_json(&text)?))
        }
        None => Ok(document),
    }
}
