use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ParticipantRepository, RepositoryError};
use crate::participant::Participant;

/// Participants kept in a process-local map
#[derive(Debug, Default)]
pub struct MemoryRepository {
    participants: RwLock<HashMap<String, Participant>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryRepository {
    async fn save(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        let now = Utc::now();
        let mut participants = self.participants.write().await;

        if let Some(id) = &participant.id {
            let stored = participants
                .get_mut(id)
                .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
            stored.apply_update(&participant);
            stored.updated = now;
            return Ok(stored.clone());
        }

        let id = Uuid::new_v4().to_string();
        let mut created = participant;
        created.id = Some(id.clone());
        created.created = now;
        created.updated = now;
        participants.insert(id, created.clone());

        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Participant, RepositoryError> {
        self.participants
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn get_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let mut all: Vec<Participant> = self.participants.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.participants
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> Participant {
        Participant {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            score: 3,
            ..Participant::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let repo = MemoryRepository::new();
        let saved = repo.save(participant("alice")).await.unwrap();

        let id = saved.id.clone().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(saved.created, saved.updated);
        assert_eq!(repo.get(&id).await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let repo = MemoryRepository::new();
        let saved = repo.save(participant("bob")).await.unwrap();

        let update = Participant {
            id: saved.id.clone(),
            comment: "late".to_string(),
            ..Participant::default()
        };
        let updated = repo.save(update).await.unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.name, "bob");
        assert_eq!(updated.comment, "late");
        assert_eq!(updated.score, 3);
        assert_eq!(updated.created, saved.created);
        assert!(updated.updated >= saved.updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = MemoryRepository::new();
        let update = Participant {
            id: Some("nonExisting".to_string()),
            ..Participant::default()
        };
        assert!(matches!(
            repo.save(update).await,
            Err(RepositoryError::NotFound(id)) if id == "nonExisting"
        ));
    }

    #[tokio::test]
    async fn test_get_all_and_delete() {
        let repo = MemoryRepository::new();
        let first = repo.save(participant("carol")).await.unwrap();
        let second = repo.save(participant("dave")).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&first));
        assert!(all.contains(&second));

        let id = first.id.unwrap();
        repo.delete(&id).await.unwrap();
        assert!(matches!(repo.get(&id).await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(repo.delete(&id).await, Err(RepositoryError::NotFound(_))));
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_empty() {
        let repo = MemoryRepository::new();
        assert!(repo.get_all().await.unwrap().is_empty());
    }
}
