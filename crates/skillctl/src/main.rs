//! skillctl - command-line front end for the skill extraction engine.
//!
//! Logs go to stderr so stdout stays parseable with `--json`.

mod render;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use skill_core::config::{validate_threshold, DEFAULT_CONFIG_FILE};
use skill_core::{EngineConfig, SkillEngine, TokenizerKind};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Extract and canonicalize skills from free text.
#[derive(Parser)]
#[command(name = "skillctl")]
#[command(about = "Extract, match and rank skills against a taxonomy")]
#[command(version)]
struct Cli {
    /// Config file path (overrides ./skills.conf)
    #[arg(long, global = true, env = "SKILLCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Taxonomy file, JSON or YAML (default: built-in taxonomy)
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    /// Minimum confidence for fuzzy matches, 0.0 to 1.0
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Number of ranked skills to show
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Tokenizer: auto, regex, or linguistic
    #[arg(long, global = true, value_parser = parse_tokenizer)]
    tokenizer: Option<TokenizerKind>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List skill mentions found in text, by category
    Extract {
        /// Text to scan (reads stdin when omitted)
        text: Option<String>,

        /// Read text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Match surface forms to canonical skills
    Match {
        /// Surface forms to match
        #[arg(required = true)]
        skills: Vec<String>,
    },

    /// Extract, enrich and rank skills in text
    Analyze {
        /// Text to scan (reads stdin when omitted)
        text: Option<String>,

        /// Read text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Show taxonomy categories and their skills
    Categories,
}

fn parse_tokenizer(s: &str) -> Result<TokenizerKind, String> {
    TokenizerKind::parse(s).ok_or_else(|| {
        format!(
            "invalid tokenizer '{}', expected: auto, regex, linguistic",
            s
        )
    })
}

fn main() {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let engine = SkillEngine::new(&config).wrap_err("failed to load skill taxonomy")?;

    match cli.command {
        Command::Extract { text, file } => {
            let text = read_input(text, file.as_deref())?;
            let mentions = engine.extract(&text);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&mentions)?);
            } else {
                render::print_mentions(&mentions);
            }
        }
        Command::Match { skills } => {
            let results = engine.match_many(skills.iter().map(String::as_str));
            if cli.json {
                let records: Vec<render::MatchRecord<'_>> =
                    results.iter().map(render::MatchRecord::from).collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                render::print_matches(&results);
            }
        }
        Command::Analyze { text, file } => {
            let text = read_input(text, file.as_deref())?;
            let report = engine.analyze(&text);
            if cli.json {
                println!("{}", report.to_json_pretty()?);
            } else {
                render::print_report(&report);
            }
        }
        Command::Categories => {
            if cli.json {
                let categories: serde_json::Map<String, serde_json::Value> = engine
                    .taxonomy()
                    .categories()
                    .iter()
                    .map(|c| (c.name.clone(), serde_json::json!(c.skills)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                render::print_categories(engine.taxonomy());
            }
        }
    }

    Ok(())
}

/// Defaults, then `--config` or `./skills.conf`, then command-line flags.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match cli.config {
        Some(ref path) => EngineConfig::from_file(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?,
        None => {
            let local = Path::new(DEFAULT_CONFIG_FILE);
            if local.is_file() {
                EngineConfig::from_file(local)
                    .wrap_err_with(|| format!("failed to read config {}", local.display()))?
            } else {
                EngineConfig::default()
            }
        }
    };

    if let Some(ref taxonomy) = cli.taxonomy {
        config.taxonomy_path = Some(taxonomy.clone());
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = validate_threshold(threshold).wrap_err("invalid --threshold")?;
    }
    if let Some(top_n) = cli.top_n {
        config.top_n = top_n;
    }
    if let Some(tokenizer) = cli.tokenizer {
        config.tokenizer = tokenizer;
    }

    debug!(
        taxonomy = ?config.taxonomy_path,
        threshold = config.threshold,
        top_n = config.top_n,
        tokenizer = config.tokenizer.as_str(),
        containment_policy = config.containment_policy.as_str(),
        "resolved config"
    );
    Ok(config)
}

/// Text from the argument, a file, or stdin, in that order.
fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .wrap_err("failed to read stdin")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "skillctl",
            "--threshold",
            "0.7",
            "--top-n",
            "5",
            "--tokenizer",
            "regex",
            "categories",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert!((config.threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.tokenizer, TokenizerKind::Regex);
    }

    #[test]
    fn out_of_range_threshold_flag_is_rejected() {
        let cli = Cli::try_parse_from(["skillctl", "--threshold", "1.5", "categories"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn unknown_tokenizer_is_a_usage_error() {
        assert!(Cli::try_parse_from(["skillctl", "--tokenizer", "spacy", "categories"]).is_err());
    }
}
