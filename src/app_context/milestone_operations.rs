use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use super::{AppContext, Provenance};
use crate::backend::ListFilter;
use crate::entities::{Milestone, MilestoneStatus};
use crate::errors::StoreError;
use crate::reconcile;
use crate::storage::OverlayData;

#[derive(Clone, Debug, Default)]
pub struct MilestoneCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct MilestoneUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<MilestoneStatus>,
    pub target_date: Option<DateTime<Utc>>,
}

impl MilestoneUpdateRequest {
    pub fn status_only(status: MilestoneStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn apply(&self, milestone: &mut Milestone) {
        if let Some(title) = &self.title {
            milestone.title = title.clone();
        }
        if let Some(description) = &self.description {
            milestone.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            milestone.status = status;
        }
        if let Some(target_date) = self.target_date {
            milestone.target_date = Some(target_date);
        }
        milestone.updated_at = Utc::now();
    }
}

impl AppContext {
    // ----- Milestone lifecycle --------------------------------------------

    pub async fn fetch_milestones(&self, project_id: &str) -> Result<Vec<Milestone>> {
        let data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => Ok(data
                .milestones_by_project
                .get(project_id)
                .cloned()
                .unwrap_or_default()),
            Provenance::SharedSystem => {
                let token = self.auth.access_token();
                let upstream = self
                    .backend
                    .list_milestones(token.as_deref(), project_id, ListFilter::default())
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to list milestones for project {}: {}", project_id, e)
                    })?;
                let overlay = self.overlay.load();
                let effective = reconcile::apply_overlay(
                    &upstream,
                    overlay.milestones_for(project_id),
                    overlay.milestone_tombstones(project_id),
                );
                {
                    let mut state = self.state.lock().await;
                    state
                        .upstream_milestones
                        .insert(project_id.to_string(), upstream);
                }
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(effective)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .list_milestones(Some(&token), project_id, ListFilter::default())
                    .await
                    .map_err(|e| {
                        anyhow!("Failed to list milestones for project {}: {}", project_id, e)
                    })
            }
        }
    }

    pub async fn create_milestone(
        &self,
        project_id: &str,
        request: MilestoneCreateRequest,
    ) -> Result<Milestone> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let milestone = Milestone::new_local(
                    project_id,
                    request.title,
                    request.description,
                    request.target_date,
                );
                data.milestones_by_project
                    .entry(project_id.to_string())
                    .or_default()
                    .push(milestone.clone());
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(milestone)
            }
            Provenance::SharedSystem => {
                let milestone = Milestone::new_local(
                    project_id,
                    request.title,
                    request.description,
                    request.target_date,
                );
                let mut overlay = self.overlay.load();
                overlay.upsert_milestone(project_id, milestone.clone());
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(milestone)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .create_milestone(&token, project_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to create milestone: {}", e))
            }
        }
    }

    pub async fn update_milestone(
        &self,
        project_id: &str,
        milestone_id: &str,
        request: MilestoneUpdateRequest,
    ) -> Result<Milestone> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let milestones = data
                    .milestones_by_project
                    .get_mut(project_id)
                    .ok_or_else(|| StoreError::MilestoneNotFound {
                        project_id: project_id.to_string(),
                        id: milestone_id.to_string(),
                    })?;
                let milestone = milestones
                    .iter_mut()
                    .find(|m| m.id == milestone_id)
                    .ok_or_else(|| StoreError::MilestoneNotFound {
                        project_id: project_id.to_string(),
                        id: milestone_id.to_string(),
                    })?;
                request.apply(milestone);
                let updated = milestone.clone();
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(updated)
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                let mut milestone = self
                    .shared_milestone(project_id, milestone_id, &overlay)
                    .await
                    .ok_or_else(|| StoreError::MilestoneNotFound {
                        project_id: project_id.to_string(),
                        id: milestone_id.to_string(),
                    })?;
                request.apply(&mut milestone);
                overlay.upsert_milestone(project_id, milestone.clone());
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(milestone)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .update_milestone(&token, project_id, milestone_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to update milestone {}: {}", milestone_id, e))
            }
        }
    }

    pub async fn delete_milestone(&self, project_id: &str, milestone_id: &str) -> Result<()> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                if let Some(milestones) = data.milestones_by_project.get_mut(project_id) {
                    milestones.retain(|m| m.id != milestone_id);
                }
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(())
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                overlay.record_milestone_deletion(project_id, milestone_id);
                self.overlay.save(&overlay);
                self.refresh_shared_counts(project_id, &overlay).await;
                Ok(())
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .delete_milestone(&token, project_id, milestone_id)
                    .await
                    .map_err(|e| anyhow!("Failed to delete milestone {}: {}", milestone_id, e))
            }
        }
    }

    async fn shared_milestone(
        &self,
        project_id: &str,
        milestone_id: &str,
        overlay: &OverlayData,
    ) -> Option<Milestone> {
        if overlay
            .milestone_tombstones(project_id)
            .is_some_and(|t| t.contains(milestone_id))
        {
            return None;
        }
        if let Some(milestone) = overlay
            .milestones_for(project_id)
            .iter()
            .find(|m| m.id == milestone_id)
        {
            return Some(milestone.clone());
        }
        let state = self.state.lock().await;
        state
            .upstream_milestones
            .get(project_id)
            .and_then(|milestones| milestones.iter().find(|m| m.id == milestone_id))
            .cloned()
    }
}
