//! DynamoDB participant storage
//!
//! Every write is a single conditional `UpdateItem`, so creating and partially
//! updating a participant never needs a read first. Timestamps are stored as unix
//! seconds.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::{ParticipantRepository, RepositoryError};
use crate::logger;
use crate::participant::Participant;

/// One stored row
pub type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("conditional check failed")]
    ConditionFailed,

    #[error("{0}")]
    Service(String),
}

/// A conditional `UpdateItem` keyed by `id`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItem {
    pub id: String,
    pub update_expression: String,
    pub condition_expression: String,
    pub names: HashMap<String, String>,
    pub values: Item,
}

/// The table operations the repository needs
#[async_trait]
pub trait Table: Send + Sync {
    /// Apply `update` and return the item as stored afterwards
    async fn update_item(&self, update: UpdateItem) -> Result<Item, TableError>;

    async fn get_item(&self, id: &str) -> Result<Option<Item>, TableError>;

    /// Every item, following scan pagination to the end
    async fn scan(&self) -> Result<Vec<Item>, TableError>;

    /// Delete `id`, failing with [`TableError::ConditionFailed`] when absent
    async fn delete_item(&self, id: &str) -> Result<(), TableError>;
}

/// [`Table`] backed by the AWS SDK client
pub struct DynamoTable {
    client: Client,
    name: String,
}

impl DynamoTable {
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

fn service_error<E, R>(err: SdkError<E, R>) -> TableError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    TableError::Service(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl Table for DynamoTable {
    async fn update_item(&self, update: UpdateItem) -> Result<Item, TableError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.name)
            .key("id", AttributeValue::S(update.id))
            .update_expression(update.update_expression)
            .condition_expression(update.condition_expression)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(ref service)
                    if service.err().is_conditional_check_failed_exception() =>
                {
                    TableError::ConditionFailed
                }
                e => service_error(e),
            })?;

        Ok(output.attributes().cloned().unwrap_or_default())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>, TableError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(service_error)?;

        Ok(output.item().cloned())
    }

    async fn scan(&self) -> Result<Vec<Item>, TableError> {
        let mut pages = self
            .client
            .scan()
            .table_name(&self.name)
            .into_paginator()
            .send();

        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            items.extend(page.items().iter().cloned());
        }
        Ok(items)
    }

    async fn delete_item(&self, id: &str) -> Result<(), TableError> {
        self.client
            .delete_item()
            .table_name(&self.name)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(ref service)
                    if service.err().is_conditional_check_failed_exception() =>
                {
                    TableError::ConditionFailed
                }
                e => service_error(e),
            })?;
        Ok(())
    }
}

/// Participants stored in a DynamoDB table keyed by the string attribute `id`
pub struct DynamoRepository {
    table: Arc<dyn Table>,
}

impl DynamoRepository {
    /// Load the AWS configuration from the environment and use table `name`
    pub async fn connect(name: impl Into<String>, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = loader.load().await;

        let name = name.into();
        logger::log_info(&format!("[Storage] Using DynamoDB table `{name}`"));
        Self::with_table(Arc::new(DynamoTable::new(Client::new(&sdk_config), name)))
    }

    pub fn with_table(table: Arc<dyn Table>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl ParticipantRepository for DynamoRepository {
    async fn save(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        let exists = participant.id.is_some();
        let update = build_update(&participant, Utc::now().timestamp());
        let id = update.id.clone();

        match self.table.update_item(update).await {
            Ok(item) => item_to_participant(&item),
            Err(TableError::ConditionFailed) if exists => Err(RepositoryError::NotFound(id)),
            Err(e) => Err(RepositoryError::Backend(e.to_string())),
        }
    }

    async fn get(&self, id: &str) -> Result<Participant, RepositoryError> {
        match self.table.get_item(id).await {
            Ok(Some(item)) if !item.is_empty() => item_to_participant(&item),
            Ok(_) => Err(RepositoryError::NotFound(id.to_string())),
            Err(e) => Err(RepositoryError::Backend(e.to_string())),
        }
    }

    async fn get_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let items = self
            .table
            .scan()
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        let mut all = items
            .iter()
            .map(item_to_participant)
            .collect::<Result<Vec<_>, _>>()?;
        all.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        match self.table.delete_item(id).await {
            Ok(()) => Ok(()),
            Err(TableError::ConditionFailed) => Err(RepositoryError::NotFound(id.to_string())),
            Err(e) => Err(RepositoryError::Backend(e.to_string())),
        }
    }
}

/// Build the write for `participant`
///
/// Without an id a fresh one is generated and the item must not exist yet; with an
/// id the item must exist. Only non-empty strings and a non-zero score are set, and
/// `created` is written once.
fn build_update(participant: &Participant, now: i64) -> UpdateItem {
    let (id, condition) = match &participant.id {
        Some(id) => (id.clone(), "attribute_exists(#id)"),
        None => (Uuid::new_v4().to_string(), "attribute_not_exists(#id)"),
    };

    let mut names = HashMap::from([
        ("#id".to_string(), "id".to_string()),
        ("#created".to_string(), "created".to_string()),
        ("#updated".to_string(), "updated".to_string()),
    ]);
    let mut values = HashMap::from([(":now".to_string(), AttributeValue::N(now.to_string()))]);
    let mut assignments = vec![
        "#created = if_not_exists(#created, :now)".to_string(),
        "#updated = :now".to_string(),
    ];

    let mut set = |field: &str, value: AttributeValue| {
        names.insert(format!("#{field}"), field.to_string());
        values.insert(format!(":{field}"), value);
        assignments.push(format!("#{field} = :{field}"));
    };

    for (field, value) in [
        ("name", &participant.name),
        ("email", &participant.email),
        ("phone", &participant.phone),
        ("org", &participant.org),
        ("comment", &participant.comment),
    ] {
        if !value.is_empty() {
            set(field, AttributeValue::S(value.clone()));
        }
    }
    if participant.score != 0 {
        set("score", AttributeValue::N(participant.score.to_string()));
    }

    UpdateItem {
        id,
        update_expression: format!("SET {}", assignments.join(", ")),
        condition_expression: condition.to_string(),
        names,
        values,
    }
}

fn item_to_participant(item: &Item) -> Result<Participant, RepositoryError> {
    Ok(Participant {
        id: string_attr(item, "id"),
        name: string_attr(item, "name").unwrap_or_default(),
        email: string_attr(item, "email").unwrap_or_default(),
        phone: string_attr(item, "phone").unwrap_or_default(),
        org: string_attr(item, "org").unwrap_or_default(),
        score: number_attr(item, "score")?.unwrap_or(0),
        comment: string_attr(item, "comment").unwrap_or_default(),
        created: timestamp_attr(item, "created")?,
        updated: timestamp_attr(item, "updated")?,
    })
}

fn string_attr(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn number_attr(item: &Item, name: &str) -> Result<Option<i64>, RepositoryError> {
    let Some(value) = item.get(name) else {
        return Ok(None);
    };
    value
        .as_n()
        .ok()
        .and_then(|n| n.parse().ok())
        .map(Some)
        .ok_or_else(|| RepositoryError::Backend(format!("attribute `{name}` is not an integer")))
}

fn timestamp_attr(item: &Item, name: &str) -> Result<DateTime<Utc>, RepositoryError> {
    match number_attr(item, name)? {
        Some(secs) => DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            RepositoryError::Backend(format!("attribute `{name}` is out of range"))
        }),
        None => Ok(DateTime::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records writes and answers from canned data
    #[derive(Default)]
    struct MockTable {
        updates: Mutex<Vec<UpdateItem>>,
        item: Option<Item>,
        items: Vec<Item>,
        condition_fails: bool,
        fails: bool,
    }

    impl MockTable {
        fn check(&self) -> Result<(), TableError> {
            if self.fails {
                return Err(TableError::Service("throttled".to_string()));
            }
            if self.condition_fails {
                return Err(TableError::ConditionFailed);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Table for MockTable {
        async fn update_item(&self, update: UpdateItem) -> Result<Item, TableError> {
            self.updates.lock().unwrap().push(update.clone());
            self.check()?;

            // ALL_NEW for a fresh item: every placeholder value under its field name
            let mut item = Item::from([("id".to_string(), AttributeValue::S(update.id))]);
            for (placeholder, value) in update.values {
                match placeholder.trim_start_matches(':') {
                    "now" => {
                        item.insert("created".to_string(), value.clone());
                        item.insert("updated".to_string(), value);
                    }
                    field => {
                        item.insert(field.to_string(), value);
                    }
                }
            }
            Ok(item)
        }

        async fn get_item(&self, _id: &str) -> Result<Option<Item>, TableError> {
            self.check()?;
            Ok(self.item.clone())
        }

        async fn scan(&self) -> Result<Vec<Item>, TableError> {
            self.check()?;
            Ok(self.items.clone())
        }

        async fn delete_item(&self, _id: &str) -> Result<(), TableError> {
            self.check()
        }
    }

    fn repository(mock: &Arc<MockTable>) -> DynamoRepository {
        DynamoRepository::with_table(Arc::clone(mock) as Arc<dyn Table>)
    }

    fn stored(id: &str, name: &str, created: i64) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::S(id.to_string())),
            ("name".to_string(), AttributeValue::S(name.to_string())),
            ("score".to_string(), AttributeValue::N("3".to_string())),
            ("created".to_string(), AttributeValue::N(created.to_string())),
            ("updated".to_string(), AttributeValue::N(created.to_string())),
        ])
    }

    #[tokio::test]
    async fn test_get_missing_item_is_not_found() {
        let repo = repository(&Arc::new(MockTable::default()));
        assert!(matches!(repo.get("nope").await, Err(RepositoryError::NotFound(id)) if id == "nope"));

        let repo = repository(&Arc::new(MockTable {
            item: Some(Item::new()),
            ..MockTable::default()
        }));
        assert!(matches!(repo.get("nope").await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_converts_item() {
        let repo = repository(&Arc::new(MockTable {
            item: Some(stored("p1", "Ada", 1_700_000_000)),
            ..MockTable::default()
        }));
        let participant = repo.get("p1").await.unwrap();
        assert_eq!(participant.id.as_deref(), Some("p1"));
        assert_eq!(participant.name, "Ada");
        assert_eq!(participant.score, 3);
        assert!(participant.email.is_empty());
        assert_eq!(participant.created.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_delete_missing_item_is_not_found() {
        let repo = repository(&Arc::new(MockTable {
            condition_fails: true,
            ..MockTable::default()
        }));
        assert!(matches!(repo.delete("p1").await, Err(RepositoryError::NotFound(id)) if id == "p1"));

        let repo = repository(&Arc::new(MockTable::default()));
        assert!(repo.delete("p1").await.is_ok());
    }

    #[tokio::test]
    async fn test_backend_failures() {
        let repo = repository(&Arc::new(MockTable {
            fails: true,
            ..MockTable::default()
        }));
        assert!(matches!(repo.get("p1").await, Err(RepositoryError::Backend(_))));
        assert!(matches!(repo.get_all().await, Err(RepositoryError::Backend(_))));
        assert!(matches!(repo.delete("p1").await, Err(RepositoryError::Backend(_))));
        assert!(matches!(
            repo.save(Participant::default()).await,
            Err(RepositoryError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_update_sets_only_populated_fields() {
        let mock = Arc::new(MockTable::default());
        let repo = repository(&mock);

        let update = Participant {
            id: Some("p1".to_string()),
            email: "ada@example.com".to_string(),
            ..Participant::default()
        };
        let saved = repo.save(update).await.unwrap();
        assert_eq!(saved.id.as_deref(), Some("p1"));
        assert_eq!(saved.email, "ada@example.com");

        let updates = mock.updates.lock().unwrap();
        let write = &updates[0];
        assert_eq!(write.id, "p1");
        assert_eq!(write.condition_expression, "attribute_exists(#id)");
        assert_eq!(
            write.update_expression,
            "SET #created = if_not_exists(#created, :now), #updated = :now, #email = :email"
        );
        assert_eq!(
            write.values[":email"],
            AttributeValue::S("ada@example.com".to_string())
        );
        assert!(!write.names.contains_key("#name"));
        assert!(!write.values.contains_key(":score"));
    }

    #[tokio::test]
    async fn test_insert_generates_id() {
        let mock = Arc::new(MockTable::default());
        let repo = repository(&mock);

        let saved = repo
            .save(Participant {
                name: "Ada".to_string(),
                score: -2,
                ..Participant::default()
            })
            .await
            .unwrap();
        let id = saved.id.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(saved.score, -2);
        assert_eq!(saved.created, saved.updated);

        let updates = mock.updates.lock().unwrap();
        assert_eq!(updates[0].id, id);
        assert_eq!(updates[0].condition_expression, "attribute_not_exists(#id)");
        assert_eq!(updates[0].values[":score"], AttributeValue::N("-2".to_string()));
    }

    #[tokio::test]
    async fn test_update_of_missing_item_is_not_found() {
        let repo = repository(&Arc::new(MockTable {
            condition_fails: true,
            ..MockTable::default()
        }));
        let result = repo
            .save(Participant {
                id: Some("gone".to_string()),
                name: "x".to_string(),
                ..Participant::default()
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(id)) if id == "gone"));
    }

    #[tokio::test]
    async fn test_get_all_sorted_by_creation() {
        let repo = repository(&Arc::new(MockTable {
            items: vec![stored("b", "Second", 200), stored("a", "First", 100)],
            ..MockTable::default()
        }));
        let all = repo.get_all().await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_malformed_number_is_backend_error() {
        let mut item = stored("p1", "Ada", 100);
        item.insert("score".to_string(), AttributeValue::S("three".to_string()));
        assert!(matches!(
            item_to_participant(&item),
            Err(RepositoryError::Backend(_))
        ));
    }
}
