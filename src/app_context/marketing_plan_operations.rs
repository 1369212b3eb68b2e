use anyhow::{anyhow, Result};
use chrono::Utc;

use super::{AppContext, Provenance};
use crate::backend::ListFilter;
use crate::entities::{MarketingPlan, MarketingPlanStatus};
use crate::errors::StoreError;
use crate::reconcile;
use crate::storage::OverlayData;

#[derive(Clone, Debug, Default)]
pub struct MarketingPlanCreateRequest {
    pub title: String,
    pub content: String,
    pub budget: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct MarketingPlanUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<MarketingPlanStatus>,
    pub budget: Option<f64>,
}

impl MarketingPlanUpdateRequest {
    pub fn status_only(status: MarketingPlanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    fn apply(&self, plan: &mut MarketingPlan) {
        if let Some(title) = &self.title {
            plan.title = title.clone();
        }
        if let Some(content) = &self.content {
            plan.content = content.clone();
        }
        if let Some(status) = self.status {
            plan.status = status;
        }
        if let Some(budget) = self.budget {
            plan.budget = Some(budget);
        }
        plan.updated_at = Utc::now();
    }
}

impl AppContext {
    // ----- Marketing plan lifecycle ---------------------------------------

    pub async fn fetch_marketing_plans(&self, project_id: &str) -> Result<Vec<MarketingPlan>> {
        let data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => Ok(data
                .marketing_plans_by_project
                .get(project_id)
                .cloned()
                .unwrap_or_default()),
            Provenance::SharedSystem => {
                let token = self.auth.access_token();
                let upstream = self
                    .backend
                    .list_marketing_plans(token.as_deref(), project_id, ListFilter::default())
                    .await
                    .map_err(|e| {
                        anyhow!(
                            "Failed to list marketing plans for project {}: {}",
                            project_id,
                            e
                        )
                    })?;
                let overlay = self.overlay.load();
                let effective = reconcile::apply_overlay(
                    &upstream,
                    overlay.marketing_plans_for(project_id),
                    overlay.marketing_plan_tombstones(project_id),
                );
                {
                    let mut state = self.state.lock().await;
                    state
                        .upstream_marketing_plans
                        .insert(project_id.to_string(), upstream);
                }
                Ok(effective)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .list_marketing_plans(Some(&token), project_id, ListFilter::default())
                    .await
                    .map_err(|e| {
                        anyhow!(
                            "Failed to list marketing plans for project {}: {}",
                            project_id,
                            e
                        )
                    })
            }
        }
    }

    pub async fn create_marketing_plan(
        &self,
        project_id: &str,
        request: MarketingPlanCreateRequest,
    ) -> Result<MarketingPlan> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let plan = MarketingPlan::new_local(
                    project_id,
                    request.title,
                    request.content,
                    request.budget,
                );
                data.marketing_plans_by_project
                    .entry(project_id.to_string())
                    .or_default()
                    .push(plan.clone());
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(plan)
            }
            Provenance::SharedSystem => {
                let plan = MarketingPlan::new_local(
                    project_id,
                    request.title,
                    request.content,
                    request.budget,
                );
                let mut overlay = self.overlay.load();
                overlay.upsert_marketing_plan(project_id, plan.clone());
                self.overlay.save(&overlay);
                Ok(plan)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .create_marketing_plan(&token, project_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to create marketing plan: {}", e))
            }
        }
    }

    pub async fn update_marketing_plan(
        &self,
        project_id: &str,
        plan_id: &str,
        request: MarketingPlanUpdateRequest,
    ) -> Result<MarketingPlan> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                let plans = data
                    .marketing_plans_by_project
                    .get_mut(project_id)
                    .ok_or_else(|| StoreError::MarketingPlanNotFound {
                        project_id: project_id.to_string(),
                        id: plan_id.to_string(),
                    })?;
                let plan = plans
                    .iter_mut()
                    .find(|p| p.id == plan_id)
                    .ok_or_else(|| StoreError::MarketingPlanNotFound {
                        project_id: project_id.to_string(),
                        id: plan_id.to_string(),
                    })?;
                request.apply(plan);
                let updated = plan.clone();
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(updated)
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                let mut plan = self
                    .shared_marketing_plan(project_id, plan_id, &overlay)
                    .await
                    .ok_or_else(|| StoreError::MarketingPlanNotFound {
                        project_id: project_id.to_string(),
                        id: plan_id.to_string(),
                    })?;
                request.apply(&mut plan);
                overlay.upsert_marketing_plan(project_id, plan.clone());
                self.overlay.save(&overlay);
                Ok(plan)
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .update_marketing_plan(&token, project_id, plan_id, request)
                    .await
                    .map_err(|e| anyhow!("Failed to update marketing plan {}: {}", plan_id, e))
            }
        }
    }

    pub async fn delete_marketing_plan(&self, project_id: &str, plan_id: &str) -> Result<()> {
        let mut data = self.local.load();
        match self.classify_project(project_id, &data).await? {
            Provenance::LocalOwned => {
                if let Some(plans) = data.marketing_plans_by_project.get_mut(project_id) {
                    plans.retain(|p| p.id != plan_id);
                }
                data.recompute_counts(project_id);
                self.local.save(&data);
                self.sync_local_project(&data, project_id).await;
                Ok(())
            }
            Provenance::SharedSystem => {
                let mut overlay = self.overlay.load();
                overlay.record_marketing_plan_deletion(project_id, plan_id);
                self.overlay.save(&overlay);
                Ok(())
            }
            Provenance::RemoteOwned => {
                let token = self.access_token()?;
                self.backend
                    .delete_marketing_plan(&token, project_id, plan_id)
                    .await
                    .map_err(|e| anyhow!("Failed to delete marketing plan {}: {}", plan_id, e))
            }
        }
    }

    async fn shared_marketing_plan(
        &self,
        project_id: &str,
        plan_id: &str,
        overlay: &OverlayData,
    ) -> Option<MarketingPlan> {
        if overlay
            .marketing_plan_tombstones(project_id)
            .is_some_and(|t| t.contains(plan_id))
        {
            return None;
        }
        if let Some(plan) = overlay
            .marketing_plans_for(project_id)
            .iter()
            .find(|p| p.id == plan_id)
        {
            return Some(plan.clone());
        }
        let state = self.state.lock().await;
        state
            .upstream_marketing_plans
            .get(project_id)
            .and_then(|plans| plans.iter().find(|p| p.id == plan_id))
            .cloned()
    }
}
