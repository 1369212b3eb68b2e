use thiserror::Error;

/// Precondition and lookup failures raised by the entity lifecycle
/// controllers. These are hard errors: they indicate a caller bug or a
/// missing record, never a transient condition worth retrying.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Project not found in the local store or the reconciled view
    #[error("Project {0} not found")]
    ProjectNotFound(String),

    /// Task not found in the store owning the project's children
    #[error("Task {id} not found in project {project_id}")]
    TaskNotFound { project_id: String, id: String },

    /// Milestone not found in the store owning the project's children
    #[error("Milestone {id} not found in project {project_id}")]
    MilestoneNotFound { project_id: String, id: String },

    /// Marketing plan not found in the store owning the project's children
    #[error("Marketing plan {id} not found in project {project_id}")]
    MarketingPlanNotFound { project_id: String, id: String },

    /// The shared system record itself is immutable; only its child overlay
    /// may change
    #[error("System project {0} is read-only")]
    ReadOnlySystemProject(String),

    /// Operation requires an authenticated session
    #[error("Not authenticated")]
    Unauthenticated,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ProjectNotFound(_)
                | StoreError::TaskNotFound { .. }
                | StoreError::MilestoneNotFound { .. }
                | StoreError::MarketingPlanNotFound { .. }
        )
    }
}
