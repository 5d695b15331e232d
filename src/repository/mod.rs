//! Participant storage
//!
//! Handlers depend only on [`ParticipantRepository`]. Both binaries store participants
//! in DynamoDB when `TABLE_NAME` is set and in memory otherwise.

mod dynamo;
mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::participant::Participant;

pub use dynamo::{DynamoRepository, DynamoTable, Item, Table, TableError, UpdateItem};
pub use memory::MemoryRepository;

use crate::logger;

/// Environment variable naming the DynamoDB table
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";
/// Environment variable overriding the AWS region
pub const REGION_ENV: &str = "REGION";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("participant `{0}` does not exist")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage operations for participants
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Insert when `participant.id` is `None`, otherwise partially update the
    /// existing record
    async fn save(&self, participant: Participant) -> Result<Participant, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Participant, RepositoryError>;

    async fn get_all(&self) -> Result<Vec<Participant>, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

pub type SharedRepository = Arc<dyn ParticipantRepository>;

/// Pick the backend from the environment
pub async fn from_env() -> SharedRepository {
    match std::env::var(TABLE_NAME_ENV) {
        Ok(table) if !table.is_empty() => {
            let region = std::env::var(REGION_ENV).ok().filter(|r| !r.is_empty());
            Arc::new(DynamoRepository::connect(table, region).await)
        }
        _ => {
            logger::log_warning(&format!(
                "[Storage] {TABLE_NAME_ENV} is not set, participants are kept in memory"
            ));
            Arc::new(MemoryRepository::new())
        }
    }
}
