//! Row derivations for the trigger and extension pages, and dashboard URLs.

use serde::Serialize;
use serde_json::Value;

use crate::filters::{
    matches_label_filters, pipeline_name_from_filters, task_name_from_filters, LabelFilter,
    TaskKind,
};
use crate::model::{ClusterTriggerBinding, Extension, TriggerTemplate};

const KUBERNETES_RESOURCE_EXTENSION: &str = "kubernetes-resource";

pub fn pipeline_run_url(namespace: &str, name: &str) -> String {
    format!("/namespaces/{}/pipelineruns/{}", namespace, name)
}

pub fn task_run_url(namespace: &str, name: &str) -> String {
    format!("/namespaces/{}/taskruns/{}", namespace, name)
}

/// Create page link, prefilled with the pipeline the list is filtered on.
pub fn create_pipeline_run_url(filters: &[LabelFilter]) -> String {
    match pipeline_name_from_filters(filters) {
        Some(name) => format!("/pipelineruns/create?pipelineName={}", name),
        None => "/pipelineruns/create".to_string(),
    }
}

pub fn create_task_run_url(filters: &[LabelFilter]) -> String {
    match task_name_from_filters(filters) {
        Some(name) => format!(
            "/taskruns/create?taskName={}&kind={}",
            name,
            TaskKind::from_filters(filters).as_str()
        ),
        None => "/taskruns/create".to_string(),
    }
}

pub fn cluster_trigger_binding_url(name: &str) -> String {
    format!("/clustertriggerbindings/{}", name)
}

pub fn extension_url(name: &str) -> String {
    format!("/extensions/{}", name)
}

pub fn kubernetes_resources_url(group: &str, version: &str, resource_type: &str) -> String {
    format!("/{}/{}/{}", group, version, resource_type)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamRow {
    pub id: String,
    pub name: String,
    pub default: Option<Value>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceTemplateRow {
    pub id: String,
    pub name: String,
    pub kind: String,
}

pub fn trigger_template_param_rows(template: &TriggerTemplate) -> Vec<ParamRow> {
    template
        .spec
        .params
        .iter()
        .map(|p| ParamRow {
            id: p.name.clone(),
            name: p.name.clone(),
            default: p.default.clone(),
            description: p.description.clone(),
        })
        .collect()
}

/// Resource template names fall back to `generateName`; the index keeps ids
/// unique when several templates share a generated name.
pub fn trigger_template_resource_rows(template: &TriggerTemplate) -> Vec<ResourceTemplateRow> {
    template
        .spec
        .resourcetemplates
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let name = if item.metadata.name.is_empty() {
                item.metadata.generate_name.clone().unwrap_or_default()
            } else {
                item.metadata.name.clone()
            };
            ResourceTemplateRow {
                id: format!("{}|{}", index, name),
                name,
                kind: item.kind.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTriggerBindingRow {
    pub id: String,
    pub name: String,
    pub created: Option<String>,
    pub url: String,
}

pub fn cluster_trigger_binding_rows(
    bindings: &[ClusterTriggerBinding],
    filters: &[LabelFilter],
) -> Vec<ClusterTriggerBindingRow> {
    bindings
        .iter()
        .filter(|b| matches_label_filters(&b.metadata.labels, filters))
        .map(|b| ClusterTriggerBindingRow {
            id: b.metadata.name.clone(),
            name: b.metadata.name.clone(),
            created: b.metadata.creation_timestamp.clone(),
            url: cluster_trigger_binding_url(&b.metadata.name),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingParamRow {
    pub id: String,
    pub name: String,
    pub value: Value,
}

pub fn cluster_trigger_binding_param_rows(binding: &ClusterTriggerBinding) -> Vec<BindingParamRow> {
    binding
        .spec
        .params
        .iter()
        .map(|p| BindingParamRow {
            id: p.name.clone(),
            name: p.name.clone(),
            value: p.value.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionRow {
    pub id: String,
    pub display_name: String,
    pub url: String,
}

pub fn extension_rows(extensions: &[Extension]) -> Vec<ExtensionRow> {
    extensions
        .iter()
        .map(|ext| {
            let url = if ext.extension_type.as_deref() == Some(KUBERNETES_RESOURCE_EXTENSION) {
                kubernetes_resources_url(
                    ext.api_group.as_deref().unwrap_or(""),
                    ext.api_version.as_deref().unwrap_or(""),
                    &ext.name,
                )
            } else {
                extension_url(&ext.name)
            };
            ExtensionRow {
                id: ext.name.clone(),
                display_name: ext.display_name.clone(),
                url,
            }
        })
        .collect()
}
