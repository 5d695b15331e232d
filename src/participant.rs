//! Participant resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant record as stored and exchanged over HTTP
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub org: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub updated: DateTime<Utc>,
}

impl Participant {
    /// Copy the populated fields of `update` onto `self`
    ///
    /// Empty strings and a zero score mean "unchanged", so a score can never be
    /// reset to zero through a partial update.
    pub fn apply_update(&mut self, update: &Self) {
        merge_field(&mut self.name, &update.name);
        merge_field(&mut self.email, &update.email);
        merge_field(&mut self.phone, &update.phone);
        merge_field(&mut self.org, &update.org);
        merge_field(&mut self.comment, &update.comment);
        if update.score != 0 {
            self.score = update.score;
        }
    }
}

fn merge_field(target: &mut String, value: &str) {
    if !value.is_empty() {
        value.clone_into(target);
    }
}
