//! Reconciliation of the local and remote project lists, and projection of
//! session overlay deltas over upstream child fetches.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::entities::{HasRecordId, Project};

/// Merges locally-owned projects with projects fetched from the backend
/// into one deduplicated, recency-sorted view.
///
/// Duplicate ids resolve last-writer-wins (in practice only a system project
/// appearing identically in two remote fetches). The output is sorted
/// non-increasing by effective timestamp; the sort is stable, so ties break
/// deterministically for a given input ordering.
pub fn merge_project_lists(local: Vec<Project>, remote: Vec<Project>) -> Vec<Project> {
    let mut by_id: IndexMap<String, Project> = IndexMap::new();
    for project in local.into_iter().chain(remote) {
        by_id.insert(project.id.clone(), project);
    }
    let mut merged: Vec<Project> = by_id.into_values().collect();
    merged.sort_by(|a, b| b.effective_timestamp().cmp(&a.effective_timestamp()));
    merged
}

/// Applies a session overlay to an upstream record set:
///
/// 1. tombstoned upstream records are dropped;
/// 2. remaining upstream records are replaced by their same-id overlay
///    version when one exists;
/// 3. overlay records absent upstream are appended (session-only creations).
///
/// The result carries no duplicate ids, and a tombstoned id never reappears
/// however often upstream re-supplies it.
pub fn apply_overlay<T>(upstream: &[T], overlay: &[T], tombstones: Option<&HashSet<String>>) -> Vec<T>
where
    T: HasRecordId + Clone,
{
    let is_deleted = |id: &str| tombstones.is_some_and(|t| t.contains(id));

    let mut effective: Vec<T> = Vec::with_capacity(upstream.len() + overlay.len());
    let mut seen: HashSet<&str> = HashSet::new();
    for record in upstream {
        let id = record.record_id();
        if is_deleted(id) {
            continue;
        }
        seen.insert(id);
        match overlay.iter().find(|o| o.record_id() == id) {
            Some(replacement) => effective.push(replacement.clone()),
            None => effective.push(record.clone()),
        }
    }
    for record in overlay {
        let id = record.record_id();
        if is_deleted(id) || seen.contains(id) {
            continue;
        }
        effective.push(record.clone());
    }
    effective
}
