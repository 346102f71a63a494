//! Label keys and query parameter names shared with the orchestration system
//! and the hosting page.

pub const PIPELINE: &str = "tekton.dev/pipeline";
pub const PIPELINE_RUN: &str = "tekton.dev/pipelineRun";
pub const PIPELINE_TASK: &str = "tekton.dev/pipelineTask";
pub const CONDITION_CHECK: &str = "tekton.dev/conditionCheck";
pub const TASK: &str = "tekton.dev/task";
pub const CLUSTER_TASK: &str = "tekton.dev/clusterTask";

pub mod query {
    pub const PIPELINE_TASK: &str = "pipelineTask";
    pub const RETRY: &str = "retry";
    pub const STEP: &str = "step";
    pub const VIEW: &str = "view";
    pub const STATUS: &str = "status";
    pub const LABEL_SELECTOR: &str = "labelSelector";
}
