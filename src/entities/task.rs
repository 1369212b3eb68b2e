use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HasRecordId;
use crate::ids;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Advances exactly one step in the fixed cycle
    /// `pending -> in_progress -> completed -> pending`.
    pub fn advanced(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new_local(
        project_id: &str,
        title: String,
        description: Option<String>,
        priority: TaskPriority,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ids::local_record_id(),
            project_id: project_id.to_string(),
            title,
            description,
            status: TaskStatus::Pending,
            priority,
            due_date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl HasRecordId for Task {
    fn record_id(&self) -> &str {
        &self.id
    }
}
