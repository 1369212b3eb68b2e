//! Authenticated operations against remote-owned projects: every write goes
//! to the backend and the backend's response is adopted as-is.

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{context, storages, FixedAuth, MockBackend};
use draftstore::app_context::{ProjectCreateRequest, TaskCreateRequest, TaskUpdateRequest};
use draftstore::entities::{TaskPriority, TaskStatus};
use draftstore::storage::LocalStore;

#[tokio::test]
async fn authenticated_creates_go_straight_to_the_backend() -> Result<()> {
    let (local, session) = storages();
    let backend = Arc::new(MockBackend::new());
    let ctx = context(local.clone(), session, backend.clone(), FixedAuth::signed_in());

    let project = ctx
        .create_project(ProjectCreateRequest {
            name: "Cloud native".to_string(),
            ..Default::default()
        })
        .await?;
    assert!(project.id.starts_with("remote_"));

    // Nothing lands in the durable local store.
    assert!(LocalStore::new(local).load().projects.is_empty());
    assert_eq!(backend.projects().len(), 1);
    Ok(())
}

#[tokio::test]
async fn remote_task_lifecycle_adopts_backend_responses() -> Result<()> {
    let (local, session) = storages();
    let backend = Arc::new(MockBackend::new());
    let ctx = context(local, session, backend.clone(), FixedAuth::signed_in());

    let project = ctx
        .create_project(ProjectCreateRequest {
            name: "Cloud".to_string(),
            ..Default::default()
        })
        .await?;

    let task = ctx
        .create_task(
            &project.id,
            TaskCreateRequest {
                title: "remote task".to_string(),
                priority: Some(TaskPriority::High),
                ..Default::default()
            },
        )
        .await?;
    assert!(task.id.starts_with("remote_"));
    assert_eq!(task.priority, TaskPriority::High);

    let toggled = ctx.toggle_task_status(&project.id, &task.id).await?;
    assert_eq!(toggled.status, TaskStatus::InProgress);
    assert_eq!(
        backend.tasks_of(&project.id)[0].status,
        TaskStatus::InProgress
    );

    let renamed = ctx
        .update_task(
            &project.id,
            &task.id,
            TaskUpdateRequest {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(renamed.title, "renamed");

    ctx.delete_task(&project.id, &task.id).await?;
    assert!(ctx.fetch_tasks(&project.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn backend_failures_surface_with_a_message() -> Result<()> {
    let (local, session) = storages();
    let backend = Arc::new(MockBackend::new());
    backend.fail_creates_after(0);
    let ctx = context(local, session, backend.clone(), FixedAuth::signed_in());

    let err = ctx
        .create_project(ProjectCreateRequest {
            name: "Doomed".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to create project"));
    assert!(backend.projects().is_empty());
    Ok(())
}
