use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::DashError;
use crate::labels;
use crate::model::{Condition, RunResource};
use crate::query::QueryParams;

const SUCCEEDED_CONDITION: &str = "Succeeded";

const CANCELLED_REASONS: &[&str] = &[
    "Cancelled",
    "PipelineRunCancelled",
    "TaskRunCancelled",
    "CancelledRunFinally",
    "StoppedRunFinally",
];

const PENDING_REASONS: &[&str] = &["Pending", "Started"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        }
    }
}

pub fn succeeded_condition(conditions: &[Condition]) -> Option<&Condition> {
    conditions.iter().find(|c| c.type_ == SUCCEEDED_CONDITION)
}

pub fn classify_conditions(conditions: &[Condition]) -> RunState {
    let Some(condition) = succeeded_condition(conditions) else {
        return RunState::Pending;
    };
    let reason = condition.reason.as_deref().filter(|r| !r.is_empty());
    match condition.status.as_str() {
        "True" => RunState::Succeeded,
        "False" => match reason {
            Some(r) if CANCELLED_REASONS.contains(&r) => RunState::Cancelled,
            _ => RunState::Failed,
        },
        _ => match reason {
            None => RunState::Pending,
            Some(r) if PENDING_REASONS.contains(&r) => RunState::Pending,
            Some(_) => RunState::Running,
        },
    }
}

pub fn classify<R: RunResource + ?Sized>(run: &R) -> RunState {
    classify_conditions(run.conditions())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Cancelled,
    Failed,
    Running,
    Succeeded,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Cancelled => "cancelled",
            StatusFilter::Failed => "failed",
            StatusFilter::Running => "running",
            StatusFilter::Succeeded => "succeeded",
        }
    }

    pub fn matches(self, state: RunState) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Running => !state.is_terminal(),
            StatusFilter::Succeeded => state == RunState::Succeeded,
            StatusFilter::Failed => state == RunState::Failed,
            StatusFilter::Cancelled => state == RunState::Cancelled,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(StatusFilter::All),
            "cancelled" => Ok(StatusFilter::Cancelled),
            "failed" => Ok(StatusFilter::Failed),
            "running" => Ok(StatusFilter::Running),
            "succeeded" | "completed" => Ok(StatusFilter::Succeeded),
            other => Err(DashError::UnknownStatusFilter(other.to_string())),
        }
    }
}

pub fn matches_status_filter<R: RunResource + ?Sized>(run: &R, filter: StatusFilter) -> bool {
    filter == StatusFilter::All || filter.matches(classify(run))
}

/// Status filter selected on the page; unknown values fall back to `all`.
pub fn status_filter_from_query(params: &QueryParams) -> StatusFilter {
    match params.get(labels::query::STATUS) {
        None => StatusFilter::All,
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!(%err, "ignoring status filter from query");
            StatusFilter::All
        }),
    }
}
