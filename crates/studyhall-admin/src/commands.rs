//! Maintenance operations behind the `studyhall-admin` subcommands.

use serde::Deserialize;
use studyhall_store::{NewStudyTopic, Store, StoreError};
use thiserror::Error;

/// Errors surfaced by maintenance commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read topic file: {0}")]
    TopicFileRead(#[from] std::io::Error),

    #[error("failed to parse topic file: {0}")]
    TopicFileParse(#[from] toml::de::Error),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Layout of a topic import file:
///
/// ```toml
/// [[topic]]
/// category = "science"
/// topic = "Cell division"
/// difficulty = "medium"
/// description = "Mitosis and meiosis"
/// ```
#[derive(Debug, Deserialize)]
struct TopicFile {
    #[serde(default)]
    topic: Vec<NewStudyTopic>,
}

/// Opens the store's database, which applies any pending migrations.
///
/// Returns whether a database is available.
pub async fn migrate(store: &Store) -> Result<bool, CommandError> {
    let provider = std::sync::Arc::clone(store.provider());
    let available = tokio::task::spawn_blocking(move || provider.pool().is_some()).await?;
    if available {
        tracing::info!("database schema is up to date");
    }
    Ok(available)
}

/// Parses the `[[topic]]` entries of a topic import file.
pub fn parse_topics(contents: &str) -> Result<Vec<NewStudyTopic>, CommandError> {
    let file: TopicFile = toml::from_str(contents)?;
    Ok(file.topic)
}

/// Inserts each topic and returns how many were written.
pub async fn import_topics(store: &Store, topics: Vec<NewStudyTopic>) -> Result<usize, CommandError> {
    let mut written = 0;
    for topic in topics {
        let name = topic.topic.clone();
        if store.create_study_topic(topic).await?.is_some() {
            written += 1;
        } else {
            tracing::warn!(topic = %name, "topic not imported");
        }
    }
    tracing::info!(count = written, "imported study topics");
    Ok(written)
}
