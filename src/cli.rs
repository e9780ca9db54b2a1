//! CLI interface for frontdesk

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Config};
use crate::desk::HelpDesk;
use crate::types::{HelpRequest, RequestStatus, Resolution};

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(about = "Front desk assistant that escalates what it doesn't know and learns supervisor answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "FRONTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Keep everything in memory instead of the SQLite database
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask the desk a question
    Ask {
        /// The question, as a caller would phrase it
        question: String,
    },
    /// List help requests waiting on a supervisor
    Pending {
        /// Include resolved requests
        #[arg(short, long)]
        all: bool,
    },
    /// Answer a help request as the supervisor
    Resolve {
        /// Help request ID
        id: String,
        /// The answer to teach the desk
        answer: String,
    },
    /// List everything the desk has learned
    Knowledge,
    /// Preload knowledge from a JSON file
    Seed {
        /// Array of {question, answer}, or an object with a "knowledge" array
        file: PathBuf,
    },
    /// Show configuration
    Config {
        /// Print the effective configuration (default)
        #[arg(long)]
        show: bool,
        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Debug, Deserialize)]
struct SeedPair {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// Accepted seed file layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Pairs(Vec<SeedPair>),
    Legacy { knowledge: Vec<SeedPair> },
}

impl SeedFile {
    fn into_pairs(self) -> Vec<(String, String)> {
        let pairs = match self {
            SeedFile::Pairs(pairs) => pairs,
            SeedFile::Legacy { knowledge } => knowledge,
        };
        pairs.into_iter().map(|p| (p.question, p.answer)).collect()
    }
}

fn parse_seed_file(contents: &str) -> Result<Vec<(String, String)>> {
    let file: SeedFile = serde_json::from_str(contents)
        .context("Seed file must be a JSON array of {question, answer} or an object with a \"knowledge\" array")?;
    Ok(file.into_pairs())
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    if let Commands::Config { show, path } = &cli.command {
        if *path {
            println!("{}", config_path.display());
        }
        if *show || !*path {
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        return Ok(());
    }

    let desk = HelpDesk::from_config(&config, cli.memory).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            crate::server::start(Arc::new(desk), &host, port).await?;
        }
        Commands::Ask { question } => match desk.submit_question(&question).await? {
            Resolution::Answered { source, text } => {
                println!("{}", text);
                println!("  (answered from {:?})", source);
            }
            Resolution::Escalated { request, message } => {
                println!("{}", message);
                println!("  (escalated as help request {})", request.id);
            }
        },
        Commands::Pending { all } => {
            let status = if all { None } else { Some(RequestStatus::Pending) };
            let requests = desk.list_requests(status).await?;
            if requests.is_empty() {
                println!("{}", empty_requests_message(all));
            }
            for request in &requests {
                print_request(request);
            }
        }
        Commands::Resolve { id, answer } => {
            let request = desk.submit_resolution(&id, &answer).await?;
            println!("Resolved {}: \"{}\" -> \"{}\"", request.id, request.question, answer.trim());
        }
        Commands::Knowledge => {
            let entries = desk.list_knowledge().await?;
            if entries.is_empty() {
                println!("Knowledge base is empty");
            }
            for entry in entries {
                println!("#{} [{}] {}", entry.id, entry.origin, entry.created_at.format("%Y-%m-%d %H:%M UTC"));
                println!("  Q: {}", entry.question);
                println!("  A: {}", entry.answer);
            }
        }
        Commands::Seed { file } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let added = desk.seed_knowledge(parse_seed_file(&contents)?).await?;
            println!("Added {} knowledge entries", added);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn empty_requests_message(all: bool) -> &'static str {
    if all {
        "No help requests yet"
    } else {
        "No pending requests"
    }
}

fn print_request(request: &HelpRequest) {
    println!(
        "{} [{}] {}",
        request.id,
        request.status,
        request.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Q: {}", request.question);
    if let Some(answer) = &request.answer {
        println!("  A: {}", answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_array() {
        let pairs = parse_seed_file(r#"[{"question": "Hours?", "answer": "9-6"}]"#).unwrap();
        assert_eq!(pairs, vec![("Hours?".to_string(), "9-6".to_string())]);
    }

    #[test]
    fn test_parse_legacy_data_file() {
        let legacy = r#"{
            "requests": [{"id": "abc", "question": "Parking?", "status": "pending", "answer": null}],
            "knowledge": [{"question": "Parking?", "answer": "Free lot behind the salon"}]
        }"#;
        let pairs = parse_seed_file(legacy).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, "Free lot behind the salon");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_seed_file(r#"{"entries": []}"#).is_err());
    }

    #[test]
    fn test_empty_listing_message_follows_filter() {
        assert_eq!(empty_requests_message(false), "No pending requests");
        assert_eq!(empty_requests_message(true), "No help requests yet");

        let cli = Cli::try_parse_from(["frontdesk", "pending", "--all"]).unwrap();
        assert!(matches!(cli.command, Commands::Pending { all: true }));
    }

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from(["frontdesk", "--memory", "resolve", "abc", "9am-6pm daily"]).unwrap();
        assert!(cli.memory);
        match cli.command {
            Commands::Resolve { id, answer } => {
                assert_eq!(id, "abc");
                assert_eq!(answer, "9am-6pm daily");
            }
            _ => panic!("expected resolve"),
        }
    }
}
