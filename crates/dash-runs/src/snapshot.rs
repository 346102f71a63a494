//! Entry points that recompute a page from an explicit input snapshot.
//!
//! Nothing here caches: the host refetches resources (for example after the
//! live-update connection drops) and calls `recompute` again with the new
//! snapshot.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::filters::{filters_from_query, matches_label_filters, task_runs_for_filters, LabelFilter};
use crate::labels::query;
use crate::model::{Pipeline, PipelineRun, ResourceList, RunResource, Task, TaskRun};
use crate::ordering::sort_runs_by_start_time;
use crate::placeholders::{build_task_run_view, PipelineRunTask};
use crate::query::QueryParams;
use crate::selection::{resolve_selection_id, SelectionId};
use crate::status::{classify, matches_status_filter, status_filter_from_query, RunState, StatusFilter};

/// Reads a `.json` file as JSON and anything else as YAML.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        Ok(serde_json::from_str(&raw)?)
    } else {
        Ok(serde_yaml::from_str(&raw)?)
    }
}

pub fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let list: ResourceList<T> = read_document(path)?;
    Ok(list.into_vec())
}

/// Everything the PipelineRun page is derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunInputs {
    pub pipeline_run: PipelineRun,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
    #[serde(default)]
    pub task_runs: Vec<TaskRun>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub cluster_tasks: Vec<Task>,
}

impl PipelineRunInputs {
    pub fn load(path: &Path) -> Result<Self> {
        read_document(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRunPage {
    pub state: RunState,
    pub tasks: Vec<PipelineRunTask>,
    pub selected_task: Option<String>,
    pub selected_id: Option<SelectionId>,
    pub selected_step: Option<String>,
    pub view: Option<String>,
}

pub fn recompute(inputs: &PipelineRunInputs, params: &QueryParams) -> PipelineRunPage {
    let tasks = build_task_run_view(
        inputs.pipeline.as_ref(),
        &inputs.pipeline_run,
        &inputs.tasks,
        &inputs.cluster_tasks,
        &inputs.task_runs,
    );

    let selected_task = params.get(query::PIPELINE_TASK).map(str::to_string);
    let selected_id = selected_task.as_deref().and_then(|name| {
        resolve_selection_id(
            tasks.iter().filter_map(PipelineRunTask::record),
            name,
            params.get(query::RETRY),
        )
    });

    debug!(
        pipeline_run = %inputs.pipeline_run.metadata.name,
        selected_task = ?selected_task,
        selected = selected_id.is_some(),
        "recomputed pipeline run page"
    );

    PipelineRunPage {
        state: classify(&inputs.pipeline_run),
        tasks,
        selected_task,
        selected_id,
        selected_step: params.get(query::STEP).map(str::to_string),
        view: params.get(query::VIEW).map(str::to_string),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunListQuery {
    pub status: StatusFilter,
    pub filters: Vec<LabelFilter>,
}

impl RunListQuery {
    pub fn from_query(params: &QueryParams) -> Self {
        Self {
            status: status_filter_from_query(params),
            filters: filters_from_query(params),
        }
    }
}

/// Runs matching the status and label filters, most recently started first.
pub fn recompute_list<R: RunResource + Clone>(runs: &[R], list_query: &RunListQuery) -> Vec<R> {
    let mut out: Vec<R> = runs
        .iter()
        .filter(|run| {
            matches_status_filter(*run, list_query.status)
                && matches_label_filters(&run.metadata().labels, &list_query.filters)
        })
        .cloned()
        .collect();
    sort_runs_by_start_time(&mut out);
    out
}

/// TaskRuns page variant; a ClusterTask filter also matches legacy labels.
pub fn recompute_task_run_list(runs: &[TaskRun], list_query: &RunListQuery) -> Vec<TaskRun> {
    let mut out: Vec<TaskRun> = task_runs_for_filters(runs, &list_query.filters)
        .into_iter()
        .filter(|run| matches_status_filter(*run, list_query.status))
        .cloned()
        .collect();
    sort_runs_by_start_time(&mut out);
    out
}
