//! The `rig-guard` binary: redaction, JSON recovery and guarded chat turns
//! from the command line.
//!
//! Text inputs are read from stdin. Results go to stdout, logs to stderr.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rig_guard::prelude::*;
use rig_guard_redact::RedactionSession;
use rig_guard_structured::{extract, preview};
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mask PII read from stdin with realistic mock values
    Redact {
        /// Seed for reproducible mock values
        #[arg(long)]
        seed: Option<u64>,
        /// Print the masked text together with the mock-to-original mapping as JSON
        #[arg(long)]
        show_mapping: bool,
    },
    /// Recover the first JSON object or array from text on stdin
    Extract {
        /// Shape to look for
        #[arg(long, value_enum, default_value_t = ShapeArg::Object)]
        shape: ShapeArg,
    },
    /// Validate a JSON value on stdin against a JSON Schema file
    Validate {
        /// Path to the JSON Schema
        #[arg(long)]
        schema: PathBuf,
    },
    /// Run one chat turn through a local runner (ollama by default)
    Chat {
        /// Prompt to send
        prompt: String,
        /// Model name (default: llama3.2)
        #[arg(long)]
        model: Option<String>,
        /// Mask PII before it leaves the machine and restore it in the answer
        #[arg(long)]
        redact: bool,
        /// JSON Schema file; the answer is recovered as JSON
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Explicit path to the runner binary
        #[arg(long)]
        binary: Option<PathBuf>,
        /// Runner timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeArg {
    Object,
    Array,
}

impl From<ShapeArg> for Shape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Object => Self::Object,
            ShapeArg::Array => Self::Array,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Redact { seed, show_mapping } => run_redact(seed, show_mapping).await,
        Commands::Extract { shape } => run_extract(shape.into()).await,
        Commands::Validate { schema } => run_validate(&schema).await,
        Commands::Chat {
            prompt,
            model,
            redact,
            schema,
            binary,
            timeout,
        } => {
            let config = ClientConfig::new().with_timeout(Duration::from_secs(timeout));
            let transport = CommandTransport::discover(binary, &config)
                .context("no runner binary found; pass --binary or set RIG_GUARD_COMMAND_BIN")?;
            let orchestrator = ResponseOrchestrator::flat(transport).with_config(config);
            run_chat(&orchestrator, prompt, model, redact, schema.as_deref()).await
        }
    }
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read stdin")?;
    Ok(input)
}

async fn load_schema(path: &Path) -> anyhow::Result<SchemaDescriptor> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("schema {} is not valid JSON", path.display()))?;
    Ok(SchemaDescriptor::new(value)?)
}

async fn run_redact(seed: Option<u64>, show_mapping: bool) -> anyhow::Result<()> {
    let input = read_stdin().await?;
    let config = seed.map_or_else(RedactionConfig::default, |seed| {
        RedactionConfig::default().with_seed(seed)
    });
    let mut session = RedactionSession::with_config(config);
    let masked = session.redact(&input)?;

    if show_mapping {
        let redactions: Vec<_> = session.redactions().collect();
        let report = json!({"masked": masked, "redactions": redactions});
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{masked}");
    }
    Ok(())
}

async fn run_extract(shape: Shape) -> anyhow::Result<()> {
    let input = read_stdin().await?;
    let Some(value) = extract(&input, shape) else {
        bail!("no JSON {shape} found in: {}", preview(&input));
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn run_validate(schema: &Path) -> anyhow::Result<()> {
    let schema = load_schema(schema).await?;
    let input = read_stdin().await?;
    let value: Value = serde_json::from_str(&input)
        .with_context(|| format!("stdin is not valid JSON: {}", preview(&input)))?;

    let validation = schema.validate(&value);
    if !validation.valid {
        bail!(
            "validation failed:\n{}",
            validation.errors.unwrap_or_default()
        );
    }
    println!("valid");
    Ok(())
}

async fn run_chat(
    orchestrator: &ResponseOrchestrator,
    prompt: String,
    model: Option<String>,
    redact: bool,
    schema: Option<&Path>,
) -> anyhow::Result<()> {
    let mut options = ChatOptions::new().with_redaction(redact);
    if let Some(model) = model {
        options = options.with_model(model);
    }

    if let Some(path) = schema {
        let value = orchestrator
            .json(prompt, options.with_schema(load_schema(path).await?))
            .await?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    // Redacted fragments still carry mock values, so only the refilled answer is printed.
    if redact {
        let answer = orchestrator.chat(prompt, options).await?;
        println!("{}", answer.content);
        return Ok(());
    }

    let options = options.on_token(|fragment| {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(fragment.as_bytes());
        let _ = stdout.flush();
    });
    orchestrator.chat(prompt, options).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from([
            "rig-guard", "chat", "--redact", "--model", "mistral", "hello there",
        ])
        .unwrap();
        let Commands::Chat {
            prompt,
            model,
            redact,
            timeout,
            ..
        } = cli.command
        else {
            panic!("expected chat");
        };
        assert_eq!(prompt, "hello there");
        assert_eq!(model.as_deref(), Some("mistral"));
        assert!(redact);
        assert_eq!(timeout, 300);
    }

    #[test]
    fn test_parse_extract_shape() {
        let cli = Cli::try_parse_from(["rig-guard", "extract", "--shape", "array"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Extract {
                shape: ShapeArg::Array
            }
        ));
    }
}
