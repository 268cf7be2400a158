//! # Skill Harness CLI (`skills`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `skills sync` | Sync the skills repository and rebuild the index |
//! | `skills list [--filter dim=value]` | List indexed skills grouped by domain |
//! | `skills load <query> [--compact]` | Print the candidate prompt for a query |
//! | `skills select [reply]` | Read the assistant's JSON selection (stdin by default) |
//! | `skills candidates <query>` | Print raw pre-filter results with scores |
//! | `skills show <id>` | Show one skill |
//! | `skills inject <id>...` | Load skills by id and record the usage |
//! | `skills feedback <id> useful\|notuseful` | Resolve a pending usage |
//! | `skills stats` | Usage statistics |
//! | `skills pending` | Usages still waiting for feedback |
//! | `skills config [url]` | Show config or set the repository URL |
//!
//! Diagnostics go to stderr; set `RUST_LOG` or pass `--verbose` for more.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use skill_harness_core::models::Dimension;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use skill_harness::commands::{parse_dimension_filter, App};
use skill_harness::config;

/// Skill Harness: sync, index and pre-select skills for AI assistants.
#[derive(Parser)]
#[command(
    name = "skills",
    about = "Skill Harness: a local skill repository manager for AI assistants",
    version
)]
struct Cli {
    /// Path to the configuration file (TOML).
    ///
    /// Defaults to `~/.skills-config.toml`. A missing file means defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the skills repository and rebuild the index.
    Sync,

    /// List all indexed skills, grouped by domain.
    List {
        /// Only skills whose domain, scenario or level equals a value,
        /// e.g. `--filter level=advanced`.
        #[arg(long, value_name = "DIMENSION=VALUE", value_parser = parse_filter)]
        filter: Option<(Dimension, String)>,
    },

    /// Find candidate skills for a query and print the ranking prompt.
    Load {
        /// What you need help with.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// One line per candidate instead of the full prompt.
        #[arg(long)]
        compact: bool,
    },

    /// Read the assistant's JSON selection and list the chosen skills.
    Select {
        /// The reply text. Read from stdin when omitted.
        reply: Option<String>,
    },

    /// Print the raw pre-filter ranking for a query.
    Candidates {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum candidates (defaults to `retrieval.max_candidates`).
        #[arg(long)]
        limit: Option<usize>,

        /// Show the field each keyword matched.
        #[arg(long)]
        explain: bool,
    },

    /// Show one skill.
    Show { id: String },

    /// Load skills by id and record a pending usage for each.
    Inject {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,

        /// The query that led to these skills, used for learning.
        #[arg(long)]
        query: Option<String>,
    },

    /// Tell the harness whether a loaded skill helped.
    Feedback {
        id: String,

        verdict: Verdict,

        /// Scenario phrase to learn instead of the original query.
        scenario: Vec<String>,
    },

    /// Show usage statistics.
    Stats,

    /// List usages still waiting for feedback.
    Pending,

    /// Show the configuration, or set the repository URL.
    Config { url: Option<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Verdict {
    Useful,
    #[value(name = "notuseful", alias = "not-useful")]
    NotUseful,
}

fn parse_filter(s: &str) -> Result<(Dimension, String), String> {
    parse_dimension_filter(s).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(&config_path)?;
    let mut app = App::new(cfg, config_path);

    let output = match cli.command {
        Commands::Sync => app.sync().await?,
        Commands::List { filter } => {
            app.list(filter.as_ref().map(|(d, v)| (*d, v.as_str())))
                .await?
        }
        Commands::Load { query, compact } => app.load(&query.join(" "), compact).await?,
        Commands::Select { reply } => {
            let reply = match reply {
                Some(reply) => reply,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buf)
                        .await
                        .context("Failed to read the selection from stdin")?;
                    buf
                }
            };
            app.select(&reply).await?
        }
        Commands::Candidates {
            query,
            limit,
            explain,
        } => app.candidates(&query.join(" "), limit, explain).await?,
        Commands::Show { id } => app.show(&id).await?,
        Commands::Inject { ids, query } => app.inject(&ids, query.as_deref()).await?,
        Commands::Feedback {
            id,
            verdict,
            scenario,
        } => {
            let scenario = scenario.join(" ");
            let scenario = Some(scenario.as_str()).filter(|s| !s.trim().is_empty());
            app.feedback(&id, matches!(verdict, Verdict::Useful), scenario)
                .await?
        }
        Commands::Stats => app.stats().await?,
        Commands::Pending => app.pending().await?,
        Commands::Config { url } => app.config(url.as_deref())?,
    };

    println!("{}", output.trim_end());
    Ok(())
}
