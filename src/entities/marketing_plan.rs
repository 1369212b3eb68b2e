use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HasRecordId;
use crate::ids;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketingPlanStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPlan {
    pub id: String,
    pub project_id: String,
    pub title: String,
    /// Free-form content blob; the store never inspects it.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: MarketingPlanStatus,
    #[serde(default)]
    pub budget: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketingPlan {
    pub fn new_local(project_id: &str, title: String, content: String, budget: Option<f64>) -> Self {
        let now = Utc::now();
        Self {
            id: ids::local_record_id(),
            project_id: project_id.to_string(),
            title,
            content,
            status: MarketingPlanStatus::Draft,
            budget,
            created_at: now,
            updated_at: now,
        }
    }
}

impl HasRecordId for MarketingPlan {
    fn record_id(&self) -> &str {
        &self.id
    }
}
