//! Correlation and filtering for a Tekton dashboard: joins PipelineRuns with
//! their TaskRuns and definitions, resolves the selected task and retry, and
//! filters and orders the run lists.

pub mod actions;
pub mod config;
pub mod error;
pub mod filters;
pub mod labels;
pub mod model;
pub mod ordering;
pub mod placeholders;
pub mod query;
pub mod resources;
pub mod selection;
pub mod snapshot;
pub mod status;

pub use actions::RunActions;
pub use config::DashboardProperties;
pub use error::{DashError, Result};
pub use filters::LabelFilter;
pub use model::{PipelineRun, RunResource, TaskRun, TaskRunRecord, TaskRunRole};
pub use ordering::sort_runs_by_start_time;
pub use placeholders::{build_task_run_view, PipelineRunTask, Placeholder, PlaceholderReason};
pub use query::QueryParams;
pub use selection::{resolve_selection_id, resolve_selection_target, SelectionId, SelectionTarget};
pub use snapshot::{recompute, recompute_list, PipelineRunInputs, PipelineRunPage, RunListQuery};
pub use status::{matches_status_filter, RunState, StatusFilter};
