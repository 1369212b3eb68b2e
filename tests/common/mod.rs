//! Shared test infrastructure: an in-memory backend standing in for the
//! authoritative store, and a fixed authentication provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use draftstore::app_context::{
    MarketingPlanCreateRequest, MarketingPlanUpdateRequest, MilestoneCreateRequest,
    MilestoneUpdateRequest, ProjectCreateRequest, ProjectUpdateRequest, TaskCreateRequest,
    TaskUpdateRequest,
};
use draftstore::backend::{AuthProvider, BackendApi, ListFilter};
use draftstore::entities::{
    MarketingPlan, MarketingPlanStatus, Milestone, MilestoneStatus, Project, ProjectStatus, Task,
    TaskPriority, TaskStatus,
};
use draftstore::storage::MemoryStorage;
use draftstore::AppContext;

pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
struct Remote {
    projects: Vec<Project>,
    tasks: HashMap<String, Vec<Task>>,
    milestones: HashMap<String, Vec<Milestone>>,
    marketing_plans: HashMap<String, Vec<MarketingPlan>>,
    next_id: usize,
    /// Remaining successful creates before injected failure, if set.
    creates_before_failure: Option<usize>,
    /// When set, project listing fails as if the network were down.
    listing_fails: bool,
}

impl Remote {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("remote_{}_{}", prefix, self.next_id)
    }

    fn check_create(&mut self) -> Result<()> {
        if let Some(remaining) = self.creates_before_failure.as_mut() {
            if *remaining == 0 {
                bail!("backend rejected create");
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

/// In-memory authoritative backend.
#[derive(Default)]
pub struct MockBackend {
    remote: Mutex<Remote>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the (n+1)th create call fail, counting every entity kind.
    pub fn fail_creates_after(&self, successful: usize) {
        self.remote.lock().unwrap().creates_before_failure = Some(successful);
    }

    /// Makes project listing fail, simulating an unreachable backend.
    pub fn fail_project_listing(&self) {
        self.remote.lock().unwrap().listing_fails = true;
    }

    pub fn seed_system_project(&self, name: &str) -> Project {
        let mut remote = self.remote.lock().unwrap();
        let now = Utc::now();
        let project = Project {
            id: remote.next_id("project"),
            name: name.to_string(),
            description: None,
            status: ProjectStatus::Active,
            is_system: true,
            tags: Vec::new(),
            created_at: now,
            updated_at: Some(now),
            task_count: 0,
            completed_task_count: 0,
            milestone_count: 0,
        };
        remote.projects.push(project.clone());
        project
    }

    pub fn seed_task(&self, project_id: &str, title: &str) -> Task {
        let mut remote = self.remote.lock().unwrap();
        let now = Utc::now();
        let task = Task {
            id: remote.next_id("task"),
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: now,
            updated_at: now,
        };
        remote
            .tasks
            .entry(project_id.to_string())
            .or_default()
            .push(task.clone());
        task
    }

    pub fn projects(&self) -> Vec<Project> {
        self.remote.lock().unwrap().projects.clone()
    }

    pub fn tasks_of(&self, project_id: &str) -> Vec<Task> {
        self.remote
            .lock()
            .unwrap()
            .tasks
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn milestones_of(&self, project_id: &str) -> Vec<Milestone> {
        self.remote
            .lock()
            .unwrap()
            .milestones
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn marketing_plans_of(&self, project_id: &str) -> Vec<MarketingPlan> {
        self.remote
            .lock()
            .unwrap()
            .marketing_plans
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn require_token(token: &str) -> Result<()> {
    if token != TEST_TOKEN {
        bail!("invalid access token");
    }
    Ok(())
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn list_projects(&self, _token: Option<&str>, _filter: ListFilter) -> Result<Vec<Project>> {
        let remote = self.remote.lock().unwrap();
        if remote.listing_fails {
            bail!("network unreachable");
        }
        Ok(remote.projects.clone())
    }

    async fn get_project(&self, _token: Option<&str>, id: &str) -> Result<Project> {
        self.remote
            .lock()
            .unwrap()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("project {} not found", id))
    }

    async fn create_project(&self, token: &str, request: ProjectCreateRequest) -> Result<Project> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        remote.check_create()?;
        let now = Utc::now();
        let project = Project {
            id: remote.next_id("project"),
            name: request.name,
            description: request.description,
            status: ProjectStatus::Active,
            is_system: false,
            tags: request.tags.unwrap_or_default(),
            created_at: now,
            updated_at: Some(now),
            task_count: 0,
            completed_task_count: 0,
            milestone_count: 0,
        };
        remote.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        token: &str,
        id: &str,
        request: ProjectUpdateRequest,
    ) -> Result<Project> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        let project = remote
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("project {} not found", id))?;
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
        project.updated_at = Some(Utc::now());
        Ok(project.clone())
    }

    async fn delete_project(&self, token: &str, id: &str) -> Result<()> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        remote.projects.retain(|p| p.id != id);
        remote.tasks.remove(id);
        remote.milestones.remove(id);
        remote.marketing_plans.remove(id);
        Ok(())
    }

    async fn list_tasks(
        &self,
        _token: Option<&str>,
        project_id: &str,
        _filter: ListFilter,
    ) -> Result<Vec<Task>> {
        Ok(self
            .remote
            .lock()
            .unwrap()
            .tasks
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_task(&self, _token: Option<&str>, project_id: &str, id: &str) -> Result<Task> {
        self.remote
            .lock()
            .unwrap()
            .tasks
            .get(project_id)
            .and_then(|tasks| tasks.iter().find(|t| t.id == id))
            .cloned()
            .ok_or_else(|| anyhow!("task {} not found", id))
    }

    async fn create_task(
        &self,
        token: &str,
        project_id: &str,
        request: TaskCreateRequest,
    ) -> Result<Task> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        remote.check_create()?;
        let now = Utc::now();
        let task = Task {
            id: remote.next_id("task"),
            project_id: project_id.to_string(),
            title: request.title,
            description: request.description,
            status: TaskStatus::Pending,
            priority: request.priority.unwrap_or_default(),
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
        };
        remote
            .tasks
            .entry(project_id.to_string())
            .or_default()
            .push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: TaskUpdateRequest,
    ) -> Result<Task> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        let task = remote
            .tasks
            .get_mut(project_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == id))
            .ok_or_else(|| anyhow!("task {} not found", id))?;
        if let Some(title) = request.title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = Some(description);
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(due_date) = request.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, token: &str, project_id: &str, id: &str) -> Result<()> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        if let Some(tasks) = remote.tasks.get_mut(project_id) {
            tasks.retain(|t| t.id != id);
        }
        Ok(())
    }

    async fn list_milestones(
        &self,
        _token: Option<&str>,
        project_id: &str,
        _filter: ListFilter,
    ) -> Result<Vec<Milestone>> {
        Ok(self
            .remote
            .lock()
            .unwrap()
            .milestones
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_milestone(
        &self,
        _token: Option<&str>,
        project_id: &str,
        id: &str,
    ) -> Result<Milestone> {
        self.remote
            .lock()
            .unwrap()
            .milestones
            .get(project_id)
            .and_then(|ms| ms.iter().find(|m| m.id == id))
            .cloned()
            .ok_or_else(|| anyhow!("milestone {} not found", id))
    }

    async fn create_milestone(
        &self,
        token: &str,
        project_id: &str,
        request: MilestoneCreateRequest,
    ) -> Result<Milestone> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        remote.check_create()?;
        let now = Utc::now();
        let milestone = Milestone {
            id: remote.next_id("milestone"),
            project_id: project_id.to_string(),
            title: request.title,
            description: request.description,
            status: MilestoneStatus::Upcoming,
            target_date: request.target_date,
            created_at: now,
            updated_at: now,
        };
        remote
            .milestones
            .entry(project_id.to_string())
            .or_default()
            .push(milestone.clone());
        Ok(milestone)
    }

    async fn update_milestone(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: MilestoneUpdateRequest,
    ) -> Result<Milestone> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        let milestone = remote
            .milestones
            .get_mut(project_id)
            .and_then(|ms| ms.iter_mut().find(|m| m.id == id))
            .ok_or_else(|| anyhow!("milestone {} not found", id))?;
        if let Some(title) = request.title {
            milestone.title = title;
        }
        if let Some(description) = request.description {
            milestone.description = Some(description);
        }
        if let Some(status) = request.status {
            milestone.status = status;
        }
        if let Some(target_date) = request.target_date {
            milestone.target_date = Some(target_date);
        }
        milestone.updated_at = Utc::now();
        Ok(milestone.clone())
    }

    async fn delete_milestone(&self, token: &str, project_id: &str, id: &str) -> Result<()> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        if let Some(milestones) = remote.milestones.get_mut(project_id) {
            milestones.retain(|m| m.id != id);
        }
        Ok(())
    }

    async fn list_marketing_plans(
        &self,
        _token: Option<&str>,
        project_id: &str,
        _filter: ListFilter,
    ) -> Result<Vec<MarketingPlan>> {
        Ok(self
            .remote
            .lock()
            .unwrap()
            .marketing_plans
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_marketing_plan(
        &self,
        _token: Option<&str>,
        project_id: &str,
        id: &str,
    ) -> Result<MarketingPlan> {
        self.remote
            .lock()
            .unwrap()
            .marketing_plans
            .get(project_id)
            .and_then(|ps| ps.iter().find(|p| p.id == id))
            .cloned()
            .ok_or_else(|| anyhow!("marketing plan {} not found", id))
    }

    async fn create_marketing_plan(
        &self,
        token: &str,
        project_id: &str,
        request: MarketingPlanCreateRequest,
    ) -> Result<MarketingPlan> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        remote.check_create()?;
        let now = Utc::now();
        let plan = MarketingPlan {
            id: remote.next_id("plan"),
            project_id: project_id.to_string(),
            title: request.title,
            content: request.content,
            status: MarketingPlanStatus::Draft,
            budget: request.budget,
            created_at: now,
            updated_at: now,
        };
        remote
            .marketing_plans
            .entry(project_id.to_string())
            .or_default()
            .push(plan.clone());
        Ok(plan)
    }

    async fn update_marketing_plan(
        &self,
        token: &str,
        project_id: &str,
        id: &str,
        request: MarketingPlanUpdateRequest,
    ) -> Result<MarketingPlan> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        let plan = remote
            .marketing_plans
            .get_mut(project_id)
            .and_then(|ps| ps.iter_mut().find(|p| p.id == id))
            .ok_or_else(|| anyhow!("marketing plan {} not found", id))?;
        if let Some(title) = request.title {
            plan.title = title;
        }
        if let Some(content) = request.content {
            plan.content = content;
        }
        if let Some(status) = request.status {
            plan.status = status;
        }
        if let Some(budget) = request.budget {
            plan.budget = Some(budget);
        }
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }

    async fn delete_marketing_plan(&self, token: &str, project_id: &str, id: &str) -> Result<()> {
        require_token(token)?;
        let mut remote = self.remote.lock().unwrap();
        if let Some(plans) = remote.marketing_plans.get_mut(project_id) {
            plans.retain(|p| p.id != id);
        }
        Ok(())
    }
}

/// Auth provider with a fixed answer.
pub struct FixedAuth {
    authenticated: bool,
}

impl FixedAuth {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
        }
    }

    pub fn signed_in() -> Self {
        Self {
            authenticated: true,
        }
    }
}

impl AuthProvider for FixedAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn access_token(&self) -> Option<String> {
        self.authenticated.then(|| TEST_TOKEN.to_string())
    }
}

/// Builds a context over shared storages, so tests can simulate restarts and
/// sign-in transitions by constructing a second context on the same storage.
pub fn context(
    local_storage: Arc<MemoryStorage>,
    session_storage: Arc<MemoryStorage>,
    backend: Arc<MockBackend>,
    auth: FixedAuth,
) -> AppContext {
    AppContext::new(local_storage, session_storage, backend, Arc::new(auth))
}

pub fn storages() -> (Arc<MemoryStorage>, Arc<MemoryStorage>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    (Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
}
