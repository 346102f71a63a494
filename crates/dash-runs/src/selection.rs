//! Selection of a task (and retry attempt) on the PipelineRun page.
//!
//! The page addresses a selected row by `uid` + pod name. The query string
//! stores the selection as `pipelineTask` + `retry`, so this module converts
//! between the two forms.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::labels::query;
use crate::model::{TaskRunRecord, TaskRunRole};
use crate::query::QueryParams;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectionId {
    pub uid: String,
    /// `None` when a retry was requested that the run does not have.
    pub pod_name: Option<String>,
}

impl SelectionId {
    pub fn new(uid: impl Into<String>, pod_name: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            pod_name,
        }
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.uid, self.pod_name.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionTarget {
    pub pipeline_task_name: Option<String>,
    pub retry: Option<usize>,
    pub uid: String,
}

/// Parses the `retry` query value; anything but a non-negative integer means
/// no retry was selected.
pub fn parse_retry(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|r| r.trim().parse::<usize>().ok())
}

fn find_selected<'a, I>(records: I, pipeline_task_name: &str) -> Option<&'a TaskRunRecord>
where
    I: IntoIterator<Item = &'a TaskRunRecord>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    records
        .clone()
        .find(|r| {
            matches!(&r.role, TaskRunRole::ConditionCheck { name } if name == pipeline_task_name)
        })
        .or_else(|| {
            records.clone().find(|r| {
                r.role == TaskRunRole::Task
                    && r.pipeline_task_name.as_deref() == Some(pipeline_task_name)
            })
        })
}

/// Identifier of the row selected by `pipelineTask` / `retry`.
///
/// Condition-check runs are matched before task runs. Runs without a `uid`
/// (placeholders) are never selected.
pub fn resolve_selection_id<'a, I>(
    records: I,
    pipeline_task_name: &str,
    retry: Option<&str>,
) -> Option<SelectionId>
where
    I: IntoIterator<Item = &'a TaskRunRecord>,
    I::IntoIter: Clone,
{
    let record = find_selected(records, pipeline_task_name)?;
    let uid = record.uid.clone()?;

    if let (Some(retry), Some(retry_pods)) = (parse_retry(retry), record.retry_pods.as_ref()) {
        // An index past the recorded attempts keeps the pod unresolved.
        let pod = retry_pods.get(retry).cloned().flatten();
        return Some(SelectionId::new(uid, pod));
    }

    Some(SelectionId::new(uid, record.pod_name.clone()))
}

/// Reverse index from every selectable identifier to its task and retry.
#[derive(Debug, Clone, Default)]
pub struct SelectionIndex {
    entries: HashMap<SelectionId, SelectionTarget>,
    // Rendered ids can collide (`ab`+`c` and `a`+`bc`); the first record wins.
    rendered: HashMap<String, SelectionId>,
}

impl SelectionIndex {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskRunRecord>,
    {
        let mut index = Self::default();
        for record in records {
            let Some(uid) = record.uid.as_ref() else {
                continue;
            };
            let pipeline_task_name = record.display_task_name().map(str::to_string);
            let attempts = std::iter::once((None, &record.pod_name)).chain(
                record
                    .retry_pods
                    .iter()
                    .flatten()
                    .enumerate()
                    .map(|(retry, pod)| (Some(retry), pod)),
            );
            for (retry, pod) in attempts {
                let id = SelectionId::new(uid.clone(), pod.clone());
                index.rendered.entry(id.to_string()).or_insert_with(|| id.clone());
                index.entries.insert(
                    id,
                    SelectionTarget {
                        pipeline_task_name: pipeline_task_name.clone(),
                        retry,
                        uid: uid.clone(),
                    },
                );
            }
        }
        index
    }

    pub fn get(&self, id: &SelectionId) -> Option<&SelectionTarget> {
        self.entries.get(id)
    }

    /// Looks up the rendered string form used by the presentation layer.
    pub fn get_rendered(&self, rendered: &str) -> Option<&SelectionTarget> {
        self.rendered.get(rendered).and_then(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn resolve_selection_target<'a, I>(records: I, id: &SelectionId) -> Option<SelectionTarget>
where
    I: IntoIterator<Item = &'a TaskRunRecord>,
{
    SelectionIndex::build(records).get(id).cloned()
}

/// Query parameters after the user selects a row (and optionally a step).
///
/// Returns `None` when the identifier does not belong to any run. The `view`
/// parameter is dropped whenever the selected step or task changes.
pub fn select_task<'a, I>(
    records: I,
    current: &QueryParams,
    selected: &SelectionId,
    selected_step: Option<&str>,
) -> Option<QueryParams>
where
    I: IntoIterator<Item = &'a TaskRunRecord>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    let target = resolve_selection_target(records.clone(), selected)?;
    let mut next = current.clone();

    match &target.pipeline_task_name {
        Some(name) => next.set(query::PIPELINE_TASK, name.as_str()),
        None => next.delete(query::PIPELINE_TASK),
    }
    match selected_step {
        Some(step) => next.set(query::STEP, step),
        None => next.delete(query::STEP),
    }
    match target.retry {
        Some(retry) => next.set(query::RETRY, retry.to_string()),
        None => next.delete(query::RETRY),
    }

    let current_id = current.get(query::PIPELINE_TASK).and_then(|name| {
        resolve_selection_id(records.clone(), name, current.get(query::RETRY))
    });
    let step_changed = selected_step != current.get(query::STEP);
    if step_changed || current_id.as_ref() != Some(selected) {
        next.delete(query::VIEW);
    }

    debug!(
        selected = %selected,
        pipeline_task = ?target.pipeline_task_name,
        retry = ?target.retry,
        "task selected"
    );
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskRun;
    use serde_json::json;

    fn record(value: serde_json::Value) -> TaskRunRecord {
        let tr: TaskRun = serde_json::from_value(value).expect("task run");
        TaskRunRecord::from_task_run(&tr)
    }

    fn build_with_retries() -> Vec<TaskRunRecord> {
        vec![
            record(json!({
                "metadata": { "uid": "fetch-uid", "labels": { "tekton.dev/pipelineTask": "fetch" } },
                "status": { "podName": "fetch-pod" }
            })),
            record(json!({
                "metadata": { "uid": "build-uid", "labels": { "tekton.dev/pipelineTask": "build" } },
                "status": {
                    "podName": "build-pod-2",
                    "retriesStatus": [{ "podName": "build-pod-0" }, { "podName": "build-pod-1" }]
                }
            })),
        ]
    }

    #[test]
    fn resolves_current_pod_without_retry() {
        let records = build_with_retries();
        let id = resolve_selection_id(&records, "build", None).expect("id");
        assert_eq!(id, SelectionId::new("build-uid", Some("build-pod-2".to_string())));
        assert_eq!(id.to_string(), "build-uidbuild-pod-2");
    }

    #[test]
    fn unknown_task_is_not_found() {
        let records = build_with_retries();
        assert!(resolve_selection_id(&records, "deploy", None).is_none());
    }

    #[test]
    fn retry_round_trips_through_reverse_lookup() {
        let records = build_with_retries();
        let id = resolve_selection_id(&records, "build", Some("1")).expect("id");
        assert_eq!(id.pod_name.as_deref(), Some("build-pod-1"));
        let target = resolve_selection_target(&records, &id).expect("target");
        assert_eq!(
            target,
            SelectionTarget {
                pipeline_task_name: Some("build".to_string()),
                retry: Some(1),
                uid: "build-uid".to_string(),
            }
        );
    }

    #[test]
    fn malformed_retry_means_current_pod() {
        let records = build_with_retries();
        for raw in ["", "abc", "-1", "1.5"] {
            let id = resolve_selection_id(&records, "build", Some(raw)).expect("id");
            assert_eq!(id.pod_name.as_deref(), Some("build-pod-2"), "retry {:?}", raw);
        }
    }

    #[test]
    fn out_of_range_retry_leaves_pod_unresolved() {
        let records = build_with_retries();
        let id = resolve_selection_id(&records, "build", Some("5")).expect("id");
        assert_eq!(id, SelectionId::new("build-uid", None));
        let index = SelectionIndex::build(&records);
        assert!(index.get(&id).is_none());
        for retry in ["0", "1"] {
            let valid = resolve_selection_id(&records, "build", Some(retry)).expect("id");
            assert_ne!(valid, id);
        }
    }

    #[test]
    fn retry_without_retry_status_uses_current_pod() {
        let records = build_with_retries();
        let id = resolve_selection_id(&records, "fetch", Some("0")).expect("id");
        assert_eq!(id.pod_name.as_deref(), Some("fetch-pod"));
    }

    #[test]
    fn condition_check_label_takes_precedence() {
        let records = vec![
            record(json!({
                "metadata": { "uid": "task-uid", "labels": { "tekton.dev/pipelineTask": "build" } },
                "status": { "podName": "task-pod" }
            })),
            record(json!({
                "metadata": {
                    "uid": "check-uid",
                    "labels": {
                        "tekton.dev/pipelineTask": "build",
                        "tekton.dev/conditionCheck": "build"
                    }
                },
                "status": { "podName": "check-pod" }
            })),
        ];
        let id = resolve_selection_id(&records, "build", None).expect("id");
        assert_eq!(id.uid, "check-uid");
        let target = resolve_selection_target(&records, &id).expect("target");
        assert_eq!(target.pipeline_task_name.as_deref(), Some("build"));
    }

    #[test]
    fn condition_check_run_is_not_matched_by_its_pipeline_task() {
        let records = vec![record(json!({
            "metadata": {
                "uid": "check-uid",
                "labels": {
                    "tekton.dev/pipelineTask": "build",
                    "tekton.dev/conditionCheck": "build-ready"
                }
            }
        }))];
        assert!(resolve_selection_id(&records, "build", None).is_none());
        assert!(resolve_selection_id(&records, "build-ready", None).is_some());
    }

    #[test]
    fn runs_without_uid_are_not_selectable() {
        let records = vec![record(json!({
            "metadata": { "labels": { "tekton.dev/pipelineTask": "build" } }
        }))];
        assert!(resolve_selection_id(&records, "build", None).is_none());
        assert!(SelectionIndex::build(&records).is_empty());
    }

    #[test]
    fn index_covers_every_attempt() {
        let records = build_with_retries();
        let index = SelectionIndex::build(&records);
        assert_eq!(index.len(), 4);
        let target = index.get_rendered("build-uidbuild-pod-0").expect("rendered");
        assert_eq!(target.retry, Some(0));
    }

    #[test]
    fn colliding_rendered_ids_resolve_to_first_record() {
        let records = vec![
            record(json!({
                "metadata": { "uid": "ab", "labels": { "tekton.dev/pipelineTask": "x" } },
                "status": { "podName": "c" }
            })),
            record(json!({
                "metadata": { "uid": "a", "labels": { "tekton.dev/pipelineTask": "y" } },
                "status": { "podName": "bc" }
            })),
        ];
        for _ in 0..8 {
            let index = SelectionIndex::build(&records);
            let target = index.get_rendered("abc").expect("rendered");
            assert_eq!(target.uid, "ab");
            assert_eq!(target.pipeline_task_name.as_deref(), Some("x"));
        }
    }

    #[test]
    fn out_of_range_retry_without_current_pod_matches_current_attempt() {
        let records = vec![record(json!({
            "metadata": { "uid": "build-uid", "labels": { "tekton.dev/pipelineTask": "build" } },
            "status": { "retriesStatus": [{ "podName": "build-pod-0" }] }
        }))];
        let id = resolve_selection_id(&records, "build", Some("3")).expect("id");
        assert_eq!(id, SelectionId::new("build-uid", None));
        assert_eq!(id.to_string(), "build-uid");
        // Same key as the current attempt, which has no pod yet.
        let target = resolve_selection_target(&records, &id).expect("target");
        assert_eq!(target.pipeline_task_name.as_deref(), Some("build"));
        assert_eq!(target.retry, None);
    }

    #[test]
    fn select_task_sets_retry_and_clears_view_on_change() {
        let records = build_with_retries();
        let current = QueryParams::parse("pipelineTask=fetch&view=logs&step=clone");
        let selected = SelectionId::new("build-uid", Some("build-pod-0".to_string()));
        let next = select_task(&records, &current, &selected, None).expect("next");
        assert_eq!(next.to_string(), "pipelineTask=build&retry=0");
    }

    #[test]
    fn select_task_keeps_view_when_nothing_changed() {
        let records = build_with_retries();
        let current = QueryParams::parse("pipelineTask=build&retry=1&step=compile&view=details");
        let selected = SelectionId::new("build-uid", Some("build-pod-1".to_string()));
        let next = select_task(&records, &current, &selected, Some("compile")).expect("next");
        assert_eq!(
            next.to_string(),
            "pipelineTask=build&retry=1&step=compile&view=details"
        );
    }

    #[test]
    fn select_task_drops_retry_for_current_attempt() {
        let records = build_with_retries();
        let current = QueryParams::parse("pipelineTask=build&retry=1");
        let selected = SelectionId::new("build-uid", Some("build-pod-2".to_string()));
        let next = select_task(&records, &current, &selected, Some("compile")).expect("next");
        assert_eq!(next.to_string(), "pipelineTask=build&step=compile");
    }

    #[test]
    fn select_task_rejects_unknown_identifier() {
        let records = build_with_retries();
        let selected = SelectionId::new("nope", None);
        assert!(select_task(&records, &QueryParams::new(), &selected, None).is_none());
    }
}
