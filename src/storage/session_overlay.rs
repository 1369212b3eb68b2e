use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::KeyValueStorage;
use crate::entities::{HasRecordId, MarketingPlan, Milestone, Task};

/// Default session-storage key for the overlay.
pub const SESSION_OVERLAY_KEY: &str = "draftstore_session_overlay";

/// Session-scoped deltas applied on top of shared system projects: updates
/// and session-only creations keyed by project id, plus tombstone sets for
/// deletions. Tombstones are `HashSet`s in memory (O(1) membership) and
/// serialize as plain arrays at the JSON boundary.
///
/// The overlay is only ever applied to `SharedSystem` projects. Asking it to
/// shadow a record of a local-owned or remote-owned project is a caller bug,
/// not a recoverable runtime condition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayData {
    #[serde(default)]
    pub tasks_by_project: HashMap<String, Vec<Task>>,
    #[serde(default)]
    pub milestones_by_project: HashMap<String, Vec<Milestone>>,
    #[serde(default)]
    pub marketing_plans_by_project: HashMap<String, Vec<MarketingPlan>>,
    #[serde(default)]
    pub deleted_task_ids: HashMap<String, HashSet<String>>,
    #[serde(default)]
    pub deleted_milestone_ids: HashMap<String, HashSet<String>>,
    #[serde(default)]
    pub deleted_marketing_plan_ids: HashMap<String, HashSet<String>>,
}

fn upsert<T: HasRecordId>(records: &mut Vec<T>, record: T) {
    match records
        .iter_mut()
        .find(|r| r.record_id() == record.record_id())
    {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

impl OverlayData {
    pub fn tasks_for(&self, project_id: &str) -> &[Task] {
        self.tasks_by_project
            .get(project_id)
            .map_or(&[], |t| t.as_slice())
    }

    pub fn milestones_for(&self, project_id: &str) -> &[Milestone] {
        self.milestones_by_project
            .get(project_id)
            .map_or(&[], |m| m.as_slice())
    }

    pub fn marketing_plans_for(&self, project_id: &str) -> &[MarketingPlan] {
        self.marketing_plans_by_project
            .get(project_id)
            .map_or(&[], |p| p.as_slice())
    }

    pub fn task_tombstones(&self, project_id: &str) -> Option<&HashSet<String>> {
        self.deleted_task_ids.get(project_id)
    }

    pub fn milestone_tombstones(&self, project_id: &str) -> Option<&HashSet<String>> {
        self.deleted_milestone_ids.get(project_id)
    }

    pub fn marketing_plan_tombstones(&self, project_id: &str) -> Option<&HashSet<String>> {
        self.deleted_marketing_plan_ids.get(project_id)
    }

    /// Replaces the same-id overlay entry if present, else appends.
    pub fn upsert_task(&mut self, project_id: &str, task: Task) {
        upsert(
            self.tasks_by_project
                .entry(project_id.to_string())
                .or_default(),
            task,
        );
    }

    pub fn upsert_milestone(&mut self, project_id: &str, milestone: Milestone) {
        upsert(
            self.milestones_by_project
                .entry(project_id.to_string())
                .or_default(),
            milestone,
        );
    }

    pub fn upsert_marketing_plan(&mut self, project_id: &str, plan: MarketingPlan) {
        upsert(
            self.marketing_plans_by_project
                .entry(project_id.to_string())
                .or_default(),
            plan,
        );
    }

    /// Tombstones the id and drops any same-id overlay entry, so a
    /// session-created-then-deleted record vanishes entirely instead of
    /// lingering as a tombstone of nothing.
    pub fn record_task_deletion(&mut self, project_id: &str, task_id: &str) {
        self.deleted_task_ids
            .entry(project_id.to_string())
            .or_default()
            .insert(task_id.to_string());
        if let Some(tasks) = self.tasks_by_project.get_mut(project_id) {
            tasks.retain(|t| t.id != task_id);
        }
    }

    pub fn record_milestone_deletion(&mut self, project_id: &str, milestone_id: &str) {
        self.deleted_milestone_ids
            .entry(project_id.to_string())
            .or_default()
            .insert(milestone_id.to_string());
        if let Some(milestones) = self.milestones_by_project.get_mut(project_id) {
            milestones.retain(|m| m.id != milestone_id);
        }
    }

    pub fn record_marketing_plan_deletion(&mut self, project_id: &str, plan_id: &str) {
        self.deleted_marketing_plan_ids
            .entry(project_id.to_string())
            .or_default()
            .insert(plan_id.to_string());
        if let Some(plans) = self.marketing_plans_by_project.get_mut(project_id) {
            plans.retain(|p| p.id != plan_id);
        }
    }
}

/// Session overlay store: the overlay document behind the host's
/// session-scoped key-value storage. Lives exactly as long as the session;
/// a reload discards every delta, which keeps template exploration low-risk.
pub struct OverlayStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl OverlayStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, SESSION_OVERLAY_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Defensive load: absent or unparseable fields come back empty instead
    /// of failing.
    pub fn load(&self) -> OverlayData {
        let Some(raw) = self.storage.get(&self.key) else {
            return OverlayData::default();
        };
        match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("discarding corrupt session overlay payload: {}", e);
                OverlayData::default()
            }
        }
    }

    pub fn save(&self, data: &OverlayData) {
        match serde_json::to_string(data) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.key, &raw) {
                    tracing::warn!("failed to persist session overlay: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize session overlay: {}", e),
        }
    }
}
