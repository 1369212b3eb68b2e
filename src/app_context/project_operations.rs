use anyhow::{anyhow, Result};

use super::{AppContext, Provenance};
use crate::backend::ListFilter;
use crate::entities::{Project, ProjectStatus};
use crate::errors::StoreError;
use crate::reconcile;

#[derive(Clone, Debug, Default)]
pub struct ProjectCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct ProjectUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub tags: Option<Vec<String>>,
}

impl AppContext {
    // ----- Project lifecycle ----------------------------------------------

    /// Fetches the backend project list (templates are served to anonymous
    /// callers too), reconciles it with locally-owned projects, and replaces
    /// the in-memory view with the merged result.
    ///
    /// An unreachable backend degrades to the local list alone; offline
    /// users keep seeing the projects they created offline.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let local = self.local.load();
        let token = self.auth.access_token();
        let remote = match self
            .backend
            .list_projects(token.as_deref(), ListFilter::default())
            .await
        {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!("backend unreachable, serving local projects only: {}", e);
                Vec::new()
            }
        };

        let merged = reconcile::merge_project_lists(local.projects, remote);
        {
            let mut state = self.state.lock().await;
            state.projects = merged;
        }
        // The backend list carries raw counters; shared projects with
        // session deltas need their projected counters re-applied.
        self.reproject_shared_counts().await;
        Ok(self.state.lock().await.projects.clone())
    }

    /// Returns the current in-memory reconciled view without touching the
    /// network or storage. This is what a UI layer renders between fetches;
    /// counters here track every mutation, including overlay deltas on
    /// shared projects.
    pub async fn current_projects(&self) -> Vec<Project> {
        self.state.lock().await.projects.clone()
    }

    pub async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let local = self.local.load();
        if let Some(project) = local.project(project_id) {
            return Ok(project.clone());
        }
        let token = self.auth.access_token();
        let project = self
            .backend
            .get_project(token.as_deref(), project_id)
            .await
            .map_err(|e| anyhow!("Failed to load project {}: {}", project_id, e))?;
        self.remember_project(project.clone()).await;
        Ok(project)
    }

    /// Creates against the backend when authenticated, otherwise mints a
    /// local-owned project in the durable store.
    pub async fn create_project(&self, request: ProjectCreateRequest) -> Result<Project> {
        if self.auth.is_authenticated() {
            let token = self.access_token()?;
            let project = self
                .backend
                .create_project(&token, request)
                .await
                .map_err(|e| anyhow!("Failed to create project: {}", e))?;
            self.remember_project(project.clone()).await;
            return Ok(project);
        }

        let mut data = self.local.load();
        let project = Project::new_local(
            request.name,
            request.description,
            request.tags.unwrap_or_default(),
        );
        data.projects.push(project.clone());
        data.recompute_counts(&project.id);
        self.local.save(&data);
        self.remember_project(project.clone()).await;
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        request: ProjectUpdateRequest,
    ) -> Result<Project> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let project = data
                    .project_mut(project_id)
                    .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
                if let Some(name) = request.name {
                    project.name = name;
                }
                if let Some(description) = request.description {
                    project.description = Some(description);
                }
                if let Some(status) = request.status {
                    project.status = status;
                }
                if let Some(tags) = request.tags {
                    project.tags = tags;
                }
                project.touch();
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                data.project(project_id)
                    .cloned()
                    .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()).into())
            }
            Provenance::SharedSystem => {
                Err(StoreError::ReadOnlySystemProject(project_id.to_string()).into())
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                let project = self
                    .backend
                    .update_project(&token, project_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to update project {}: {}", project_id, e))?;
                self.remember_project(project.clone()).await;
                Ok(project)
            }
        }
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                data.projects.retain(|p| p.id != project_id);
                data.tasks_by_project.remove(project_id);
                data.milestones_by_project.remove(project_id);
                data.marketing_plans_by_project.remove(project_id);
                self.local.save(&data);
                self.forget_project(project_id).await;
                Ok(())
            }
            Provenance::SharedSystem => {
                Err(StoreError::ReadOnlySystemProject(project_id.to_string()).into())
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .delete_project(&token, project_id)
                    .await
                    .map_err(|e| anyhow!("Failed to delete project {}: {}", project_id, e))?;
                self.forget_project(project_id).await;
                Ok(())
            }
        }
    }
}
