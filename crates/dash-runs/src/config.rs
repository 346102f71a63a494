//! Dashboard properties, the same document the backend serves on
//! `/v1/properties`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::snapshot::read_document;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardProperties {
    #[serde(rename = "DashboardNamespace")]
    pub dashboard_namespace: String,
    #[serde(rename = "DashboardVersion")]
    pub dashboard_version: String,
    #[serde(rename = "PipelineNamespace")]
    pub pipeline_namespace: String,
    #[serde(rename = "PipelineVersion")]
    pub pipeline_version: String,
    #[serde(rename = "TriggersNamespace", skip_serializing_if = "Option::is_none")]
    pub triggers_namespace: Option<String>,
    #[serde(rename = "TriggersVersion", skip_serializing_if = "Option::is_none")]
    pub triggers_version: Option<String>,
    #[serde(rename = "ReadOnly")]
    pub read_only: bool,
    #[serde(rename = "LogoutURL", skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
    #[serde(rename = "TenantNamespace", skip_serializing_if = "Option::is_none")]
    pub tenant_namespace: Option<String>,
    #[serde(rename = "StreamLogs")]
    pub stream_logs: bool,
    #[serde(rename = "ExternalLogsURL")]
    pub external_logs_url: String,
}

impl DashboardProperties {
    pub fn triggers_installed(&self) -> bool {
        self.triggers_version
            .as_deref()
            .is_some_and(|v| !v.is_empty())
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_document(path)
    }
}
