use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::KeyValueStorage;
use crate::entities::{MarketingPlan, Milestone, Project, Task, TaskStatus};

/// Default persistent-storage key for the durable local store.
pub const LOCAL_STORE_KEY: &str = "draftstore_local";

/// Persisted payload schema version. A bump is a breaking change: payloads
/// carrying any other version are discarded on load, not migrated.
pub const LOCAL_STORE_VERSION: u32 = 1;

/// The durable local store payload: every project created while anonymous
/// together with its child collections, keyed by project id.
///
/// `tasks_by_project` serializes as `todosByProject` to match the persisted
/// wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStoreData {
    pub version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default, rename = "todosByProject")]
    pub tasks_by_project: HashMap<String, Vec<Task>>,
    #[serde(default)]
    pub milestones_by_project: HashMap<String, Vec<Milestone>>,
    #[serde(default)]
    pub marketing_plans_by_project: HashMap<String, Vec<MarketingPlan>>,
}

impl Default for LocalStoreData {
    fn default() -> Self {
        Self {
            version: LOCAL_STORE_VERSION,
            projects: Vec::new(),
            tasks_by_project: HashMap::new(),
            milestones_by_project: HashMap::new(),
            marketing_plans_by_project: HashMap::new(),
        }
    }
}

impl LocalStoreData {
    pub fn contains_project(&self, project_id: &str) -> bool {
        self.projects.iter().any(|p| p.id == project_id)
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    /// Re-derives the three counters for one project from its live child
    /// collections. Called after every mutating operation, before any read
    /// is returned to the caller.
    pub fn recompute_counts(&mut self, project_id: &str) {
        let tasks = self.tasks_by_project.get(project_id);
        let task_count = tasks.map_or(0, |t| t.len());
        let completed_task_count = tasks.map_or(0, |t| {
            t.iter().filter(|t| t.status == TaskStatus::Completed).count()
        });
        let milestone_count = self
            .milestones_by_project
            .get(project_id)
            .map_or(0, |m| m.len());

        if let Some(project) = self.project_mut(project_id) {
            project.task_count = task_count;
            project.completed_task_count = completed_task_count;
            project.milestone_count = milestone_count;
        }
    }

    fn recompute_all_counts(&mut self) {
        let ids: Vec<String> = self.projects.iter().map(|p| p.id.clone()).collect();
        for id in ids {
            self.recompute_counts(&id);
        }
    }
}

/// Durable local store: a versioned JSON document behind the host's
/// persistent key-value storage. `load` never fails and `save` never
/// propagates; a broken storage tier must not take the caller down.
pub struct LocalStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl LocalStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, LOCAL_STORE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Parses the persisted payload. Missing, corrupt, or
    /// version-mismatched payloads yield an empty, correctly-shaped store.
    /// Counters are recomputed for every project after parse so persisted
    /// counter values are never trusted.
    pub fn load(&self) -> LocalStoreData {
        let Some(raw) = self.storage.get(&self.key) else {
            return LocalStoreData::default();
        };
        match serde_json::from_str::<LocalStoreData>(&raw) {
            Ok(mut data) if data.version == LOCAL_STORE_VERSION => {
                data.recompute_all_counts();
                data
            }
            Ok(data) => {
                tracing::warn!(
                    found = data.version,
                    expected = LOCAL_STORE_VERSION,
                    "local store version mismatch, resetting to empty"
                );
                LocalStoreData::default()
            }
            Err(e) => {
                tracing::warn!("discarding corrupt local store payload: {}", e);
                LocalStoreData::default()
            }
        }
    }

    /// Serializes and persists. Failures are logged and swallowed; the
    /// in-memory mutation that led here has already succeeded.
    pub fn save(&self, data: &LocalStoreData) {
        match serde_json::to_string(data) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.key, &raw) {
                    tracing::warn!("failed to persist local store: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize local store: {}", e),
        }
    }

    /// Drops the persisted payload entirely. Used after a successful
    /// migration.
    pub fn clear(&self) {
        self.storage.remove(&self.key);
    }
}
