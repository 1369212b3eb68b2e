use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HasRecordId;
use crate::ids;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Upcoming,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MilestoneStatus,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new_local(
        project_id: &str,
        title: String,
        description: Option<String>,
        target_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ids::local_record_id(),
            project_id: project_id.to_string(),
            title,
            description,
            status: MilestoneStatus::Upcoming,
            target_date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl HasRecordId for Milestone {
    fn record_id(&self) -> &str {
        &self.id
    }
}
