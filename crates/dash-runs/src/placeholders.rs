//! Merges a PipelineRun's real TaskRuns with placeholders for pipeline tasks
//! that have not produced a TaskRun (yet, or anymore).

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::model::{Pipeline, PipelineRun, PipelineTask, Task, TaskRun, TaskRunRecord, TaskSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    /// No TaskRun has been created for the pipeline task.
    NotStarted,
    /// The PipelineRun records a child for the task but the TaskRun is gone.
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingStep {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub pipeline_task_name: String,
    pub reason: PlaceholderReason,
    pub task_spec: Option<TaskSpec>,
    pub steps: Vec<PendingStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineRunTask {
    Real {
        record: TaskRunRecord,
        task_run: TaskRun,
    },
    Placeholder(Placeholder),
}

impl PipelineRunTask {
    fn real(task_run: &TaskRun) -> Self {
        PipelineRunTask::Real {
            record: TaskRunRecord::from_task_run(task_run),
            task_run: task_run.clone(),
        }
    }

    pub fn record(&self) -> Option<&TaskRunRecord> {
        match self {
            PipelineRunTask::Real { record, .. } => Some(record),
            PipelineRunTask::Placeholder(_) => None,
        }
    }

    pub fn task_run(&self) -> Option<&TaskRun> {
        match self {
            PipelineRunTask::Real { task_run, .. } => Some(task_run),
            PipelineRunTask::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PipelineRunTask::Placeholder(_))
    }

    /// Name shown for the row: condition check name, pipeline task, or the
    /// placeholder's pipeline task.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            PipelineRunTask::Real { record, .. } => record.display_task_name(),
            PipelineRunTask::Placeholder(p) => Some(p.pipeline_task_name.as_str()),
        }
    }
}

/// Task definition a placeholder should display: the inline spec if present,
/// else the referenced Task or ClusterTask.
fn resolve_task_spec(
    pipeline_task: &PipelineTask,
    tasks: &[Task],
    cluster_tasks: &[Task],
) -> Option<TaskSpec> {
    if let Some(spec) = &pipeline_task.task_spec {
        return Some(spec.clone());
    }
    let task_ref = pipeline_task.task_ref.as_ref()?;
    let catalog = if task_ref.is_cluster_task() {
        cluster_tasks
    } else {
        tasks
    };
    catalog
        .iter()
        .find(|t| t.metadata.name == task_ref.name)
        .map(|t| t.spec.clone())
}

fn placeholder(
    pipeline_task_name: &str,
    reason: PlaceholderReason,
    task_spec: Option<TaskSpec>,
) -> PipelineRunTask {
    let steps = task_spec
        .as_ref()
        .map(|spec| {
            spec.steps
                .iter()
                .map(|s| PendingStep {
                    name: s.name.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    PipelineRunTask::Placeholder(Placeholder {
        pipeline_task_name: pipeline_task_name.to_string(),
        reason,
        task_spec,
        steps,
    })
}

/// Builds the ordered task list for a PipelineRun page.
///
/// Declared tasks come from the Pipeline resource, or the PipelineRun's inline
/// pipeline spec when the Pipeline is unavailable. Each declared task yields
/// its real TaskRuns (condition checks included) or one placeholder. Without
/// any declaration, tasks are grouped by pipeline-task label in order of first
/// appearance. TaskRuns matching no declared task are appended last.
pub fn build_task_run_view(
    pipeline: Option<&Pipeline>,
    pipeline_run: &PipelineRun,
    tasks: &[Task],
    cluster_tasks: &[Task],
    task_runs: &[TaskRun],
) -> Vec<PipelineRunTask> {
    let recorded: BTreeSet<&str> = pipeline_run
        .child_task_runs()
        .map(|c| c.pipeline_task_name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    let reason_for = |name: &str| {
        if recorded.contains(name) {
            PlaceholderReason::Deleted
        } else {
            PlaceholderReason::NotStarted
        }
    };

    let spec = pipeline
        .map(|p| &p.spec)
        .or(pipeline_run.spec.pipeline_spec.as_ref());

    let records: Vec<TaskRunRecord> = task_runs.iter().map(TaskRunRecord::from_task_run).collect();
    let mut emitted = vec![false; task_runs.len()];
    let mut out = Vec::with_capacity(task_runs.len());
    let mut declared: HashSet<&str> = HashSet::new();
    let mut placeholders = 0usize;

    let emit_group = |name: &str,
                          out: &mut Vec<PipelineRunTask>,
                          emitted: &mut Vec<bool>|
     -> bool {
        let mut found = false;
        for (idx, record) in records.iter().enumerate() {
            if !emitted[idx] && record.pipeline_task_name.as_deref() == Some(name) {
                emitted[idx] = true;
                found = true;
                out.push(PipelineRunTask::Real {
                    record: record.clone(),
                    task_run: task_runs[idx].clone(),
                });
            }
        }
        found
    };

    match spec {
        Some(spec) => {
            for pipeline_task in spec.declared_tasks() {
                if !declared.insert(pipeline_task.name.as_str()) {
                    continue;
                }
                if !emit_group(&pipeline_task.name, &mut out, &mut emitted) {
                    placeholders += 1;
                    out.push(placeholder(
                        &pipeline_task.name,
                        reason_for(&pipeline_task.name),
                        resolve_task_spec(pipeline_task, tasks, cluster_tasks),
                    ));
                }
            }
        }
        None => {
            for record in &records {
                if let Some(name) = record.pipeline_task_name.as_deref() {
                    if declared.insert(name) {
                        emit_group(name, &mut out, &mut emitted);
                    }
                }
            }
            for &name in &recorded {
                if declared.insert(name) {
                    placeholders += 1;
                    out.push(placeholder(name, PlaceholderReason::Deleted, None));
                }
            }
        }
    }

    let mut orphans = 0usize;
    for (idx, task_run) in task_runs.iter().enumerate() {
        if !emitted[idx] {
            orphans += 1;
            out.push(PipelineRunTask::real(task_run));
        }
    }

    debug!(
        pipeline_run = %pipeline_run.metadata.name,
        declared = spec.is_some(),
        total = out.len(),
        placeholders,
        orphans,
        "built task run view"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_run(uid: &str, pipeline_task: &str) -> TaskRun {
        serde_json::from_value(json!({
            "metadata": {
                "name": format!("run-{}", uid),
                "uid": uid,
                "labels": { "tekton.dev/pipelineTask": pipeline_task }
            },
            "status": { "podName": format!("pod-{}", uid) }
        }))
        .expect("task run")
    }

    fn pipeline(tasks: serde_json::Value, finally: serde_json::Value) -> Pipeline {
        serde_json::from_value(json!({
            "metadata": { "name": "pipe" },
            "spec": { "tasks": tasks, "finally": finally }
        }))
        .expect("pipeline")
    }

    fn names(view: &[PipelineRunTask]) -> Vec<&str> {
        view.iter().map(|t| t.display_name().unwrap_or("?")).collect()
    }

    #[test]
    fn fills_gaps_in_declared_order() {
        let p = pipeline(
            json!([{ "name": "fetch" }, { "name": "build" }, { "name": "test" }]),
            json!([{ "name": "notify" }]),
        );
        let runs = vec![task_run("b", "build"), task_run("a", "fetch")];
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &[], &[], &runs);
        assert_eq!(names(&view), vec!["fetch", "build", "test", "notify"]);
        assert!(!view[0].is_placeholder());
        assert!(!view[1].is_placeholder());
        assert!(view[2].is_placeholder());
        assert!(view[3].is_placeholder());
    }

    #[test]
    fn length_is_declared_plus_orphans() {
        let p = pipeline(json!([{ "name": "a" }, { "name": "b" }]), json!(null));
        let runs = vec![
            task_run("1", "a"),
            task_run("2", "stale"),
            task_run("3", "gone"),
        ];
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &[], &[], &runs);
        assert_eq!(view.len(), 2 + 2);
        assert_eq!(names(&view), vec!["a", "b", "stale", "gone"]);
    }

    #[test]
    fn unlabeled_task_runs_surface_as_orphans() {
        let p = pipeline(json!([{ "name": "a" }]), json!(null));
        let unlabeled: TaskRun =
            serde_json::from_value(json!({ "metadata": { "name": "x", "uid": "x" } })).unwrap();
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &[], &[], &[unlabeled]);
        assert_eq!(view.len(), 2);
        assert_eq!(view[1].task_run().map(|t| t.metadata.name.as_str()), Some("x"));
    }

    #[test]
    fn placeholder_steps_come_from_referenced_cluster_task() {
        let p = pipeline(
            json!([
                { "name": "a", "taskRef": { "name": "shared", "kind": "ClusterTask" } },
                { "name": "b", "taskRef": { "name": "shared" } },
                { "name": "c", "taskSpec": { "steps": [{ "name": "inline" }] } }
            ]),
            json!(null),
        );
        let tasks: Vec<Task> = serde_json::from_value(json!([
            { "metadata": { "name": "shared" }, "spec": { "steps": [{ "name": "ns-step" }] } }
        ]))
        .unwrap();
        let cluster_tasks: Vec<Task> = serde_json::from_value(json!([
            { "metadata": { "name": "shared" }, "spec": { "steps": [{ "name": "one" }, { "name": "two" }] } }
        ]))
        .unwrap();
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &tasks, &cluster_tasks, &[]);
        let steps: Vec<Vec<&str>> = view
            .iter()
            .map(|t| match t {
                PipelineRunTask::Placeholder(p) => p.steps.iter().map(|s| s.name.as_str()).collect(),
                PipelineRunTask::Real { .. } => panic!("expected placeholder"),
            })
            .collect();
        assert_eq!(
            steps,
            vec![vec!["one", "two"], vec!["ns-step"], vec!["inline"]]
        );
    }

    #[test]
    fn recorded_children_mark_placeholders_deleted() {
        let p = pipeline(json!([{ "name": "a" }, { "name": "b" }]), json!(null));
        let run: PipelineRun = serde_json::from_value(json!({
            "metadata": { "name": "pr" },
            "status": { "taskRuns": { "pr-a-xyz": { "pipelineTaskName": "a" } } }
        }))
        .unwrap();
        let view = build_task_run_view(Some(&p), &run, &[], &[], &[]);
        let reasons: Vec<_> = view
            .iter()
            .map(|t| match t {
                PipelineRunTask::Placeholder(p) => p.reason,
                PipelineRunTask::Real { .. } => panic!("expected placeholder"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![PlaceholderReason::Deleted, PlaceholderReason::NotStarted]
        );
    }

    #[test]
    fn condition_checks_stay_with_their_task() {
        let p = pipeline(json!([{ "name": "a" }, { "name": "b" }]), json!(null));
        let check: TaskRun = serde_json::from_value(json!({
            "metadata": {
                "uid": "c",
                "labels": {
                    "tekton.dev/pipelineTask": "b",
                    "tekton.dev/conditionCheck": "b-is-ready"
                }
            }
        }))
        .unwrap();
        let runs = vec![task_run("b", "b"), check, task_run("a", "a")];
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &[], &[], &runs);
        assert_eq!(names(&view), vec!["a", "b", "b-is-ready"]);
    }

    #[test]
    fn falls_back_to_inline_pipeline_spec() {
        let run: PipelineRun = serde_json::from_value(json!({
            "metadata": { "name": "pr" },
            "spec": { "pipelineSpec": { "tasks": [{ "name": "only" }] } }
        }))
        .unwrap();
        let view = build_task_run_view(None, &run, &[], &[], &[]);
        assert_eq!(names(&view), vec!["only"]);
    }

    #[test]
    fn without_definition_groups_by_first_appearance() {
        let run: PipelineRun = serde_json::from_value(json!({
            "metadata": { "name": "pr" },
            "status": { "taskRuns": { "pr-z": { "pipelineTaskName": "z" } } }
        }))
        .unwrap();
        let runs = vec![task_run("1", "b"), task_run("2", "a"), task_run("3", "b")];
        let view = build_task_run_view(None, &run, &[], &[], &runs);
        assert_eq!(names(&view), vec!["b", "b", "a", "z"]);
        assert!(view[3].is_placeholder());
    }

    #[test]
    fn duplicate_declarations_yield_one_entry() {
        let p = pipeline(json!([{ "name": "a" }]), json!([{ "name": "a" }]));
        let view = build_task_run_view(Some(&p), &PipelineRun::default(), &[], &[], &[]);
        assert_eq!(view.len(), 1);
    }
}
