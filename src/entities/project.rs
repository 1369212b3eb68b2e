use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HasRecordId;
use crate::ids;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

/// A project record. The three `*_count` fields are derived from the child
/// collections of whichever store owns the children and are recomputed after
/// every mutation; they are never authoritative in a persisted payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub task_count: usize,
    #[serde(default)]
    pub completed_task_count: usize,
    #[serde(default)]
    pub milestone_count: usize,
}

impl Project {
    /// A project minted while offline. Lives in the durable local store until
    /// migrated, at which point it is replaced by a backend record with a
    /// different id.
    pub fn new_local(name: String, description: Option<String>, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ids::local_record_id(),
            name,
            description,
            status: ProjectStatus::Active,
            is_system: false,
            tags,
            created_at: now,
            updated_at: Some(now),
            task_count: 0,
            completed_task_count: 0,
            milestone_count: 0,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Sort key for reconciliation: `updated_at`, falling back to
    /// `created_at` when the record has never been updated.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

impl HasRecordId for Project {
    fn record_id(&self) -> &str {
        &self.id
    }
}
