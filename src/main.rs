//! Masker - PII redaction and text anonymization engine
//!
//! Command-line front end: redact or detect PII in text or JSON payloads
//! using the same engine the service embeds.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use masker::{
    EntityType, Masker, MaskerConfig, Mode, Output, Policy, PolicyStore, RedactRequest,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "masker")]
#[command(version)]
#[command(about = "PII redaction and text anonymization for LLM-bound payloads")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MASKER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact PII in a text or JSON payload
    Redact {
        /// Payload to process (text, or JSON with --json)
        input: String,

        /// Treat the input as a JSON payload
        #[arg(long)]
        json: bool,

        /// Language for the entity recognizer
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Rewrite mode: detect, mask, redact, placeholder, policy
        #[arg(short, long, default_value = "mask")]
        mode: String,

        /// Policy id to apply (with --mode policy)
        #[arg(short, long, default_value = "default")]
        policy: String,

        /// Comma-separated entity types to process (default: all)
        #[arg(short, long)]
        entities: Option<String>,
    },

    /// Detect PII without modifying the payload
    Detect {
        /// Payload to scan (text, or JSON with --json)
        input: String,

        /// Treat the input as a JSON payload
        #[arg(long)]
        json: bool,

        /// Language for the entity recognizer
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// List available policies
    Policies,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "masker=debug" } else { "masker=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Redact {
            input,
            json,
            language,
            mode,
            policy,
            entities,
        } => {
            let mode = parse_mode(&mode)?;
            let request = build_request(&input, json, &language, mode, entities.as_deref())?;

            let store = policy_store(&config)?;
            let resolved = store.get(&policy).clone();

            let masker = Masker::with_defaults(config)?;
            let result = masker.redact(&request, &resolved).await?;
            print_result(&result.output, &result.findings)?;
        }

        Commands::Detect {
            input,
            json,
            language,
        } => {
            let request = build_request(&input, json, &language, Mode::Detect, None)?;
            let masker = Masker::with_defaults(config)?;
            let result = masker.redact(&request, &Policy::builtin_default()).await?;
            println!("{}", serde_json::to_string_pretty(&result.findings)?);
        }

        Commands::Policies => {
            let store = policy_store(&config)?;
            let mut ids = store.list();
            ids.sort_unstable();
            println!("default (built-in)");
            for id in ids {
                println!("{}", id);
            }
        }

        Commands::Config { default } => {
            let shown = if default { MaskerConfig::default() } else { config };
            println!("{}", serde_yaml::to_string(&shown)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<MaskerConfig> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&contents)?)
        }
        None => Ok(MaskerConfig::default()),
    }
}

fn policy_store(config: &MaskerConfig) -> Result<PolicyStore> {
    match &config.policies_dir {
        Some(dir) => Ok(PolicyStore::load(dir)?),
        None => Ok(PolicyStore::new()),
    }
}

fn parse_mode(mode: &str) -> Result<Mode> {
    match mode {
        "detect" => Ok(Mode::Detect),
        "mask" => Ok(Mode::Mask),
        "redact" => Ok(Mode::Redact),
        "placeholder" => Ok(Mode::Placeholder),
        "policy" => Ok(Mode::Policy),
        other => bail!("unknown mode '{}'", other),
    }
}

fn parse_entities(spec: &str) -> Result<Vec<EntityType>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| EntityType::parse(s).ok_or_else(|| anyhow::anyhow!("unknown entity type '{}'", s)))
        .collect()
}

fn build_request(
    input: &str,
    json: bool,
    language: &str,
    mode: Mode,
    entities: Option<&str>,
) -> Result<RedactRequest> {
    let language = masker::Language::parse(language)?;

    let mut request = if json {
        RedactRequest::json(serde_json::from_str(input)?, mode)
    } else {
        RedactRequest::text(input, mode)
    };
    request = request.with_language(language);

    if let Some(spec) = entities {
        request = request.with_entities(parse_entities(spec)?);
    }

    Ok(request)
}

fn print_result(output: &Output, findings: &[masker::Finding]) -> Result<()> {
    match output {
        Output::Text(text) => println!("{}", text),
        Output::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
    }
    if !findings.is_empty() {
        eprintln!("{}", serde_json::to_string_pretty(findings)?);
    }
    Ok(())
}
