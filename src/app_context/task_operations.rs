use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use super::{AppContext, Provenance};
use crate::backend::ListFilter;
use crate::entities::{Task, TaskPriority, TaskStatus};
use crate::errors::StoreError;
use crate::reconcile;
use crate::storage::OverlayData;

#[derive(Clone, Debug, Default)]
pub struct TaskCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskUpdateRequest {
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
    }
}

impl AppContext {
    // ----- Task lifecycle -------------------------------------------------

    pub async fn fetch_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => Ok(data
                .tasks_by_project
                .get(project_id)
                .cloned()
                .unwrap_or_default()),
            Provenance::SharedSystem => {
                let token = self.auth.access_token();
                let upstream = self
                    .backend
                    .list_tasks(token.as_deref(), project_id, ListFilter::default())
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to list tasks for project {}: {}", project_id, e)
                    })?;
                let overlay = self.overlay.load();
                let effective = reconcile::apply_overlay(
                    &upstream,
                    overlay.tasks_for(project_id),
                    overlay.task_tombstones(project_id),
                );
                {
                    let mut state = self.state.lock().await;
                    state.upstream_tasks.insert(project_id.to_string(), upstream);
                }
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(effective)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .list_tasks(Some(&token), project_id, ListFilter::default())
                    .await
                    .map_err(|e| anyhow!("Failed to list tasks for project {}: {}", project_id, e))
            }
        }
    }

    pub async fn create_task(&self, project_id: &str, request: TaskCreateRequest) -> Result<Task> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let task = Task::new_local(
                    project_id,
                    request.title,
                    request.description,
                    request.priority.unwrap_or_default(),
                    request.due_date,
                );
                data.tasks_by_project
                    .entry(project_id.to_string())
                    .or_default()
                    .push(task.clone());
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(task)
            }
            Provenance::SharedSystem => {
                let task = Task::new_local(
                    project_id,
                    request.title,
                    request.description,
                    request.priority.unwrap_or_default(),
                    request.due_date,
                );
                let mut overlay = self.overlay.load();
                overlay.upsert_task(project_id, task.clone());
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(task)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .create_task(&token, project_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to create task: {}", e))
            }
        }
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        request: TaskUpdateRequest,
    ) -> Result<Task> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let tasks = data
                    .tasks_by_project
                    .get_mut(project_id)
                    .ok_or_else(|| StoreError::TaskNotFound {
                        project_id: project_id.to_string(),
                        id: task_id.to_string(),
                    })?;
                let task = tasks
                    .iter_mut()
                    .find(|t| t.id == task_id)
                    .ok_or_else(|| StoreError::TaskNotFound {
                        project_id: project_id.to_string(),
                        id: task_id.to_string(),
                    })?;
                request.apply(task);
                let updated = task.clone();
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(updated)
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                let mut task = self
                    .shared_task(project_id, task_id, &overlay)
                    .await
                    .ok_or_else(|| StoreError::TaskNotFound {
                        project_id: project_id.to_string(),
                        id: task_id.to_string(),
                    })?;
                request.apply(&mut task);
                overlay.upsert_task(project_id, task.clone());
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(task)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .update_task(&token, project_id, task_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to update task {}: {}", task_id, e))
            }
        }
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<()> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                if let Some(tasks) = data.tasks_by_project.get_mut(project_id) {
                    tasks.retain(|t| t.id != task_id);
                }
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(())
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                overlay.record_task_deletion(project_id, task_id);
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(())
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .delete_task(&token, project_id, task_id)
                    .await
                    .map_err(|e| anyhow!("Failed to delete task {}: {}", task_id, e))
            }
        }
    }

    /// Advances the task's status exactly one step in the fixed cycle
    /// `pending -> in_progress -> completed -> pending`.
    pub async fn toggle_task_status(&self, project_id: &str, task_id: &str) -> Result<Task> {
        let data = self.local.load();
        let current = match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => data
                .tasks_by_project
                .get(project_id)
                .and_then(|tasks| tasks.iter().find(|t| t.id == task_id))
                .cloned()
                .ok_or_else(|| StoreError::TaskNotFound {
                    project_id: project_id.to_string(),
                    id: task_id.to_string(),
                })?,
            Provenance::SharedSystem => {
                let overlay = self.overlay.load();
                self.shared_task(project_id, task_id, &overlay)
                    .await
                    .ok_or_else(|| StoreError::TaskNotFound {
                        project_id: project_id.to_string(),
                        id: task_id.to_string(),
                    })?
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .get_task(Some(&token), project_id, task_id)
                    .await
                    .map_err(|e| anyhow!("Failed to load task {}: {}", task_id, e))?
            }
        };

        self.update_task(
            project_id,
            task_id,
            TaskUpdateRequest::status_only(current.status.advanced()),
        )
        .await
    }

    /// Resolves a shared project's task from the overlay first, then the
    /// cached upstream fetch. Tombstoned ids resolve to nothing.
    async fn shared_task(
        &self,
        project_id: &str,
        task_id: &str,
        overlay: &OverlayData,
    ) -> Option<Task> {
        if overlay
            .task_tombstones(project_id)
            .is_some_and(|t| t.contains(task_id))
        {
            return None;
        }
        if let Some(task) = overlay
            .tasks_for(project_id)
            .iter()
            .find(|t| t.id == task_id)
        {
            return Some(task.clone());
        }
        let state = self.state.lock().await;
        state
            .upstream_tasks
            .get(project_id)
            .and_then(|tasks| tasks.iter().find(|t| t.id == task_id))
            .cloned()
    }
}
