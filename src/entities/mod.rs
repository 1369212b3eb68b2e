pub mod marketing_plan;
pub mod milestone;
pub mod project;
pub mod task;

pub use marketing_plan::{MarketingPlan, MarketingPlanStatus};
pub use milestone::{Milestone, MilestoneStatus};
pub use project::{Project, ProjectStatus};
pub use task::{Task, TaskPriority, TaskStatus};

/// Implemented by every child record so overlay projection and dedup can
/// work generically across kinds.
pub trait HasRecordId {
    fn record_id(&self) -> &str;
}
