use serde::Serialize;

use crate::labels;
use crate::model::RunResource;
use crate::status::{classify, RunState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunActions {
    pub rerun: bool,
    pub stop: bool,
    pub delete: bool,
}

impl RunActions {
    pub fn for_run<R: RunResource + ?Sized>(run: &R, read_only: bool) -> Self {
        if read_only {
            return RunActions::default();
        }
        // Pending runs are deletable, not stoppable.
        let running = classify(run) == RunState::Running;
        RunActions {
            rerun: true,
            stop: running,
            delete: !running,
        }
    }

    /// TaskRuns owned by a PipelineRun are rerun through their PipelineRun.
    pub fn for_task_run<R: RunResource + ?Sized>(run: &R, read_only: bool) -> Self {
        let mut actions = Self::for_run(run, read_only);
        if run.metadata().label(labels::PIPELINE).is_some() {
            actions.rerun = false;
        }
        actions
    }
}

/// Message shown when a stop or delete request fails.
pub fn request_error_message(status_code: u16, body: &str) -> String {
    if body.is_empty() {
        format!("error code {}", status_code)
    } else {
        format!("{} (error code {})", body, status_code)
    }
}
