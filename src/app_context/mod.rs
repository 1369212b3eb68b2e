//! Entity lifecycle controllers. Every operation classifies the owning
//! project's provenance once, then routes to the durable local store, the
//! session overlay, or the backend.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::backend::{AuthProvider, BackendApi};
use crate::entities::{MarketingPlan, Milestone, Project, Task, TaskStatus};
use crate::errors::StoreError;
use crate::reconcile;
use crate::storage::{KeyValueStorage, LocalStore, LocalStoreData, OverlayData, OverlayStore};

mod marketing_plan_operations;
mod migration_operations;
mod milestone_operations;
mod project_operations;
mod task_operations;

pub use marketing_plan_operations::{MarketingPlanCreateRequest, MarketingPlanUpdateRequest};
pub use milestone_operations::{MilestoneCreateRequest, MilestoneUpdateRequest};
pub use project_operations::{ProjectCreateRequest, ProjectUpdateRequest};
pub use task_operations::{TaskCreateRequest, TaskUpdateRequest};

/// Derived classification of a project, never a stored field. Determines
/// which store handles the project's mutations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Provenance {
    /// Created while anonymous; lives only in the durable local store.
    LocalOwned,
    /// Read-only template served by the backend; mutations go to the
    /// session overlay.
    SharedSystem,
    /// Ordinary authenticated-user record living on the backend.
    RemoteOwned,
}

/// In-memory view kept alongside the stores: the last reconciled project
/// list, plus the last upstream child fetch per shared project (the basis
/// for recomputing shared-project counters after overlay mutations).
#[derive(Default)]
struct SessionView {
    projects: Vec<Project>,
    upstream_tasks: HashMap<String, Vec<Task>>,
    upstream_milestones: HashMap<String, Vec<Milestone>>,
    upstream_marketing_plans: HashMap<String, Vec<MarketingPlan>>,
}

/// Shared context exposing the entity lifecycle operations to the UI layer.
///
/// Constructed once per process/session and passed by reference. Owns the
/// two store objects; their `load`/`save` calls are the only storage I/O.
/// Operations suspend only at backend calls; local and overlay paths never
/// reach the network.
pub struct AppContext {
    local: LocalStore,
    overlay: OverlayStore,
    backend: Arc<dyn BackendApi>,
    auth: Arc<dyn AuthProvider>,
    state: Mutex<SessionView>,
}

impl AppContext {
    pub fn new(
        local_storage: Arc<dyn KeyValueStorage>,
        session_storage: Arc<dyn KeyValueStorage>,
        backend: Arc<dyn BackendApi>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            local: LocalStore::new(local_storage),
            overlay: OverlayStore::new(session_storage),
            backend,
            auth,
            state: Mutex::new(SessionView::default()),
        }
    }

    /// Like [`AppContext::new`] but with explicit storage keys, for hosts
    /// that namespace their key-value storage.
    pub fn with_keys(
        local_storage: Arc<dyn KeyValueStorage>,
        session_storage: Arc<dyn KeyValueStorage>,
        backend: Arc<dyn BackendApi>,
        auth: Arc<dyn AuthProvider>,
        local_key: impl Into<String>,
        overlay_key: impl Into<String>,
    ) -> Self {
        Self {
            local: LocalStore::with_key(local_storage, local_key),
            overlay: OverlayStore::with_key(session_storage, overlay_key),
            backend,
            auth,
            state: Mutex::new(SessionView::default()),
        }
    }

    /// Classifies a project once per operation: present in the durable local
    /// store means local-owned; otherwise the reconciled view decides
    /// between shared-system and remote-owned. An unknown id is a hard
    /// precondition failure.
    pub(crate) async fn classify_project(
        &self,
        project_id: &str,
        local: &LocalStoreData,
    ) -> Result<Provenance> {
        if local.contains_project(project_id) {
            return Ok(Provenance::LocalOwned);
        }
        let state = self.state.lock().await;
        match state.projects.iter().find(|p| p.id == project_id) {
            Some(project) if project.is_system => Ok(Provenance::SharedSystem),
            Some(_) => Ok(Provenance::RemoteOwned),
            None => Err(StoreError::ProjectNotFound(project_id.to_string()).into()),
        }
    }

    fn access_token(&self) -> Result<String> {
        if !self.auth.is_authenticated() {
            return Err(StoreError::Unauthenticated.into());
        }
        self.auth
            .access_token()
            .ok_or_else(|| StoreError::Unauthenticated.into())
    }

    async fn remember_project(&self, project: Project) {
        let mut state = self.state.lock().await;
        match state.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => *slot = project,
            None => state.projects.push(project),
        }
    }

    async fn forget_project(&self, project_id: &str) {
        let mut state = self.state.lock().await;
        state.projects.retain(|p| p.id != project_id);
        state.upstream_tasks.remove(project_id);
        state.upstream_milestones.remove(project_id);
        state.upstream_marketing_plans.remove(project_id);
    }

    /// Mirrors a local project (with freshly recomputed counters) into the
    /// in-memory view after a durable-store mutation.
    async fn sync_local_project(&self, data: &LocalStoreData, project_id: &str) {
        if let Some(project) = data.project(project_id) {
            self.remember_project(project.clone()).await;
        }
    }

    /// Recomputes a shared project's counters from the overlay projected
    /// over the cached upstream fetch. A mutation issued before any child
    /// fetch counts against an empty upstream. Counters of a kind with
    /// neither a cached fetch nor overlay deltas keep their backend value.
    async fn refresh_shared_counts(&self, project_id: &str, overlay: &OverlayData) {
        let mut state = self.state.lock().await;

        let have_task_view = state.upstream_tasks.contains_key(project_id)
            || !overlay.tasks_for(project_id).is_empty()
            || overlay.task_tombstones(project_id).is_some();
        let have_milestone_view = state.upstream_milestones.contains_key(project_id)
            || !overlay.milestones_for(project_id).is_empty()
            || overlay.milestone_tombstones(project_id).is_some();

        let tasks = reconcile::apply_overlay(
            state
                .upstream_tasks
                .get(project_id)
                .map_or(&[][..], |t| t.as_slice()),
            overlay.tasks_for(project_id),
            overlay.task_tombstones(project_id),
        );
        let milestones = reconcile::apply_overlay(
            state
                .upstream_milestones
                .get(project_id)
                .map_or(&[][..], |m| m.as_slice()),
            overlay.milestones_for(project_id),
            overlay.milestone_tombstones(project_id),
        );

        if let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) {
            if have_task_view {
                project.task_count = tasks.len();
                project.completed_task_count = tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Completed)
                    .count();
            }
            if have_milestone_view {
                project.milestone_count = milestones.len();
            }
        }
    }

    /// Re-applies projected counters to every shared project that carries a
    /// cached upstream fetch or overlay deltas, after the project list has
    /// been replaced wholesale.
    async fn reproject_shared_counts(&self) {
        let overlay = self.overlay.load();
        let ids: Vec<String> = {
            let state = self.state.lock().await;
            state
                .projects
                .iter()
                .filter(|p| p.is_system)
                .filter(|p| {
                    state.upstream_tasks.contains_key(&p.id)
                        || state.upstream_milestones.contains_key(&p.id)
                        || !overlay.tasks_for(&p.id).is_empty()
                        || !overlay.milestones_for(&p.id).is_empty()
                        || overlay.task_tombstones(&p.id).is_some()
                        || overlay.milestone_tombstones(&p.id).is_some()
                })
                .map(|p| p.id.clone())
                .collect()
        };
        for id in ids {
            self.refresh_shared_counts(&id, &overlay).await;
        }
    }
}
