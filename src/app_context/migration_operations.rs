use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::{
    AppContext, MarketingPlanCreateRequest, MarketingPlanUpdateRequest, MilestoneCreateRequest,
    MilestoneUpdateRequest, ProjectCreateRequest, ProjectUpdateRequest, TaskCreateRequest,
    TaskUpdateRequest,
};
use crate::errors::StoreError;
use crate::storage::LocalStoreData;

impl AppContext {
    // ----- Migration of local work into the backend -----------------------

    /// Re-creates every locally-owned record against the backend in
    /// dependency order (project first, then its tasks, milestones and
    /// marketing plans), then clears the durable local store and re-runs the
    /// project fetch so the view reflects only remote state.
    ///
    /// Any create failure aborts the walk and surfaces the error; local
    /// state is left intact for a manual retry. Retries are not idempotent:
    /// records created before the failure are not tracked, so a retry may
    /// re-create them.
    pub async fn upload_local_projects(&self) -> Result<()> {
        if !self.auth.is_authenticated() {
            return Err(StoreError::Unauthenticated.into());
        }
        let token = self.access_token()?;

        let data = self.local.load();
        if data.projects.is_empty() {
            return Ok(());
        }

        tracing::info!(projects = data.projects.len(), "uploading local projects");
        if let Err(e) = self.upload_walk(&token, &data).await {
            tracing::error!("migration aborted, local data preserved: {:#}", e);
            return Err(e);
        }

        self.local.clear();
        self.fetch_projects().await?;
        tracing::info!("migration complete, local store cleared");
        Ok(())
    }

    async fn upload_walk(&self, token: &str, data: &LocalStoreData) -> Result<()> {
        // Projects first, recording old-local-id -> new-remote-id.
        let mut id_map: HashMap<String, String> = HashMap::new();
        for project in &data.projects {
            let created = self
                .backend
                .create_project(
                    token,
                    ProjectCreateRequest {
                        name: project.name.clone(),
                        description: project.description.clone(),
                        tags: Some(project.tags.clone()),
                    },
                )
                .await
                .map_err(|e| anyhow!("Failed to migrate project {}: {}", project.name, e))?;

            // The create endpoint only accepts the default status; statuses
            // that differ need a follow-up update.
            if project.status != created.status {
                self.backend
                    .update_project(
                        token,
                        &created.id,
                        ProjectUpdateRequest {
                            status: Some(project.status),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to set status for project {}: {}", project.name, e)
                    })?;
            }
            id_map.insert(project.id.clone(), created.id.clone());
        }

        // Children under their new project ids, in local project order.
        for project in &data.projects {
            let Some(remote_id) = id_map.get(&project.id) else {
                continue;
            };

            for task in data.tasks_by_project.get(&project.id).into_iter().flatten() {
                let created = self
                    .backend
                    .create_task(
                        token,
                        remote_id,
                        TaskCreateRequest {
                            title: task.title.clone(),
                            description: task.description.clone(),
                            priority: Some(task.priority),
                            due_date: task.due_date,
                        },
                    )
                    .await
                    .map_err(|e| anyhow!("Failed to migrate task {}: {}", task.title, e))?;
                if task.status != created.status {
                    self.backend
                        .update_task(
                            token,
                            remote_id,
                            &created.id,
                            TaskUpdateRequest::status_only(task.status),
                        )
                        .await
                        .map_err(|e| {
                            anyhow!("Failed to set status for task {}: {}", task.title, e)
                        })?;
                }
            }

            for milestone in data
                .milestones_by_project
                .get(&project.id)
                .into_iter()
                .flatten()
            {
                let created = self
                    .backend
                    .create_milestone(
                        token,
                        remote_id,
                        MilestoneCreateRequest {
                            title: milestone.title.clone(),
                            description: milestone.description.clone(),
                            target_date: milestone.target_date,
                        },
                    )
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to migrate milestone {}: {}", milestone.title, e)
                    })?;
                if milestone.status != created.status {
                    self.backend
                        .update_milestone(
                            token,
                            remote_id,
                            &created.id,
                            MilestoneUpdateRequest::status_only(milestone.status),
                        )
                        .await
                        .map_err(|e| {
                            anyhow!("Failed to set status for milestone {}: {}", milestone.title, e)
                        })?;
                }
            }

            for plan in data
                .marketing_plans_by_project
                .get(&project.id)
                .into_iter()
                .flatten()
            {
                let created = self
                    .backend
                    .create_marketing_plan(
                        token,
                        remote_id,
                        MarketingPlanCreateRequest {
                            title: plan.title.clone(),
                            content: plan.content.clone(),
                            budget: plan.budget,
                        },
                    )
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to migrate marketing plan {}: {}", plan.title, e)
                    })?;
                if plan.status != created.status {
                    self.backend
                        .update_marketing_plan(
                            token,
                            remote_id,
                            &created.id,
                            MarketingPlanUpdateRequest::status_only(plan.status),
                        )
                        .await
                        .map_err(|e| {
                            anyhow!(
                                "Failed to set status for marketing plan {}: {}",
                                plan.title,
                                e
                            )
                        })?;
                }
            }

            tracing::info!(project = %project.name, remote_id = %remote_id, "project migrated");
        }

        Ok(())
    }
}
