//! Label filters for the list pages.
//!
//! TaskRuns created from a ClusterTask carry `tekton.dev/clusterTask=<name>`,
//! but runs created by older releases only have `tekton.dev/task=<name>`. The
//! TaskRuns page for a ClusterTask shows both.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::DashError;
use crate::labels;
use crate::model::{ObjectMeta, RunResource};
use crate::query::QueryParams;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(&self.key) == Some(&self.value)
    }
}

impl FromStr for LabelFilter {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| DashError::InvalidLabelFilter(s.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DashError::InvalidLabelFilter(s.to_string()));
        }
        Ok(LabelFilter::new(key, value.trim()))
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Filters from the comma separated `labelSelector` parameter. Malformed
/// entries are skipped.
pub fn filters_from_query(params: &QueryParams) -> Vec<LabelFilter> {
    let Some(raw) = params.get(labels::query::LABEL_SELECTOR) else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<LabelFilter>() {
            Ok(filter) => Some(filter),
            Err(err) => {
                warn!(%err, "skipping label filter from query");
                None
            }
        })
        .collect()
}

pub fn matches_label_filters(labels: &BTreeMap<String, String>, filters: &[LabelFilter]) -> bool {
    filters.iter().all(|f| f.matches(labels))
}

fn filter_value<'a>(filters: &'a [LabelFilter], key: &str) -> Option<&'a str> {
    filters
        .iter()
        .find(|f| f.key == key)
        .map(|f| f.value.as_str())
}

pub fn pipeline_name_from_filters(filters: &[LabelFilter]) -> Option<&str> {
    filter_value(filters, labels::PIPELINE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    Task,
    ClusterTask,
}

impl TaskKind {
    pub fn from_filters(filters: &[LabelFilter]) -> Self {
        if filter_value(filters, labels::CLUSTER_TASK).is_some() {
            TaskKind::ClusterTask
        } else {
            TaskKind::Task
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Task => "Task",
            TaskKind::ClusterTask => "ClusterTask",
        }
    }
}

pub fn task_name_from_filters(filters: &[LabelFilter]) -> Option<&str> {
    match TaskKind::from_filters(filters) {
        TaskKind::ClusterTask => filter_value(filters, labels::CLUSTER_TASK),
        TaskKind::Task => filter_value(filters, labels::TASK),
    }
}

fn identity(meta: &ObjectMeta) -> (Option<&str>, Option<&str>, &str) {
    match meta.uid.as_deref().filter(|u| !u.is_empty()) {
        Some(uid) => (Some(uid), None, ""),
        None => (None, meta.namespace.as_deref(), meta.name.as_str()),
    }
}

/// Applies `filters`; on a ClusterTask page also keeps runs labelled only with
/// the legacy `tekton.dev/task` key. Each run appears once, in input order.
pub fn task_runs_for_filters<'a, R: RunResource>(
    task_runs: &'a [R],
    filters: &[LabelFilter],
) -> Vec<&'a R> {
    let legacy = match (TaskKind::from_filters(filters), task_name_from_filters(filters)) {
        (TaskKind::ClusterTask, Some(name)) => Some(LabelFilter::new(labels::TASK, name)),
        _ => None,
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for run in task_runs {
        let meta = run.metadata();
        let selected = matches_label_filters(&meta.labels, filters)
            || legacy.as_ref().is_some_and(|f| f.matches(&meta.labels));
        if selected && seen.insert(identity(meta)) {
            out.push(run);
        }
    }
    out
}
