//! studyhall-admin binary: schema migration, progress reports, and topic
//! catalog maintenance against the configured database.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use studyhall_admin::{build_store, commands, config, init_tracing};
use studyhall_store::{Difficulty, Store};

#[derive(Debug, Parser)]
#[command(name = "studyhall-admin", version, about = "Maintenance tooling for the studyhall database")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the database and apply pending schema migrations.
    Migrate,
    /// Print aggregate progress for a user.
    Stats {
        #[arg(long)]
        user_id: i64,
    },
    /// List study topics, optionally filtered.
    Topics {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Import study topics from a TOML file of `[[topic]]` entries.
    ImportTopics { path: String },
}

fn resolve_config_path(cli_arg: Option<String>) -> (Option<String>, &'static str) {
    if let Some(path) = cli_arg.filter(|value| !value.trim().is_empty()) {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("STUDYHALL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn print_json<T: Serialize>(value: &T) -> Result<(), commands::CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(store: &Store, command: Command) -> Result<(), commands::CommandError> {
    match command {
        Command::Migrate => {
            let available = commands::migrate(store).await?;
            print_json(&serde_json::json!({ "database_available": available }))
        }
        Command::Stats { user_id } => {
            let stats = store.get_user_progress_stats(user_id).await?;
            print_json(&stats)
        }
        Command::Topics {
            category,
            difficulty,
        } => {
            let topics = store
                .get_study_topics(category.as_deref(), difficulty)
                .await?;
            print_json(&topics)
        }
        Command::ImportTopics { path } => {
            let contents = std::fs::read_to_string(&path)?;
            let topics = commands::parse_topics(&contents)?;
            let imported = commands::import_topics(store, topics).await?;
            print_json(&serde_json::json!({ "imported": imported }))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (resolved_config_path, config_source) = resolve_config_path(cli.config);
    let selected_config_path = resolved_config_path.as_deref().or(Some("studyhall.toml"));

    let config = match config::load_config(selected_config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("studyhall-admin: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let store = build_store(&config);
    let result = run(&store, cli.command).await;

    let provider = Arc::clone(store.provider());
    drop(store);
    if let Ok(provider) = Arc::try_unwrap(provider) {
        provider.close();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
