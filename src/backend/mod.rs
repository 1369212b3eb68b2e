//! Consumed collaborator interfaces: the authoritative backend entity API
//! and the authentication state query. Host environments (HTTP client, auth
//! subsystem) implement these; the store never reaches the network except
//! through [`BackendApi`].

use anyhow::Result;
use async_trait::async_trait;

use crate::app_context::{
    MarketingPlanCreateRequest, MarketingPlanUpdateRequest, MilestoneCreateRequest,
    MilestoneUpdateRequest, ProjectCreateRequest, ProjectUpdateRequest, TaskCreateRequest,
    TaskUpdateRequest,
};
use crate::entities::{MarketingPlan, Milestone, Project, Task};

/// Optional status/pagination filters accepted by every `list` operation.
#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// The authoritative backend entity API.
///
/// Reads take an optional access token, since shared system templates are
/// served to anonymous callers too. Writes require a token. Every write returns the
/// authoritative post-write record; callers must adopt that response rather
/// than a locally-constructed guess.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn list_projects(&self, token: Option<&str>, filter: ListFilter) -> Result<Vec<Project>>;
    async fn get_project(&self, token: Option<&str>, id: &str) -> Result<Project>;
    async fn create_project(&self, token: &str, request: ProjectCreateRequest) -> Result<Project>;
    async fn update_project(
        &self,
        token: &str,
        id: &str,
        request: ProjectUpdateRequest,
    ) -> Result<Project>;
    async fn delete_project(&self, token: &str, id: &str) -> Result<()>;

    async fn list_tasks(
        &self,
        token: Option<&str>,
        project_id: &str,
        filter: ListFilter,
    ) -> Result<Vec<Task>>;
    async fn get_task(&self, token: Option<&str>, project_id: &str, id: &str) -> Result<Task>;
    async fn create_task(
        &self,
        token: &str,
        project_id: &str,
        request: TaskCreateRequest,
    ) -> Result<Task>;
    async fn update_task(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: TaskUpdateRequest,
    ) -> Result<Task>;
    async fn delete_task(&self, token: &str, project_id: &str, id: &str) -> Result<()>;

    async fn list_milestones(
        &self,
        token: Option<&str>,
        project_id: &str,
        filter: ListFilter,
    ) -> Result<Vec<Milestone>>;
    async fn get_milestone(
        &self,
        token: Option<&str>,
        project_id: &str,
        id: &str,
    ) -> Result<Milestone>;
    async fn create_milestone(
        &self,
        token: &str,
        project_id: &str,
        request: MilestoneCreateRequest,
    ) -> Result<Milestone>;
    async fn update_milestone(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: MilestoneUpdateRequest,
    ) -> Result<Milestone>;
    async fn delete_milestone(&self, token: &str, project_id: &str, id: &str) -> Result<()>;

    async fn list_marketing_plans(
        &self,
        token: Option<&str>,
        project_id: &str,
        filter: ListFilter,
    ) -> Result<Vec<MarketingPlan>>;
    async fn get_marketing_plan(
        &self,
        token: Option<&str>,
        project_id: &str,
        id: &str,
    ) -> Result<MarketingPlan>;
    async fn create_marketing_plan(
        &self,
        token: &str,
        project_id: &str,
        request: MarketingPlanCreateRequest,
    ) -> Result<MarketingPlan>;
    async fn update_marketing_plan(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: MarketingPlanUpdateRequest,
    ) -> Result<MarketingPlan>;
    async fn delete_marketing_plan(&self, token: &str, project_id: &str, id: &str) -> Result<()>;
}

/// Authentication state query, consulted before every local-vs-remote
/// routing choice.
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn access_token(&self) -> Option<String>;
}
