use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dash_runs::filters::LabelFilter;
use dash_runs::model::{ClusterTriggerBinding, Extension, TriggerTemplate};
use dash_runs::resources::{self, ExtensionRow};
use dash_runs::selection::select_task;
use dash_runs::snapshot::{load_list, read_document, recompute_task_run_list};
use dash_runs::status::classify;
use dash_runs::{
    recompute, recompute_list, DashboardProperties, PipelineRun, PipelineRunInputs,
    PipelineRunPage, PipelineRunTask, QueryParams, RunActions, RunListQuery, RunResource,
    SelectionId, StatusFilter, TaskRun,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dash", version = "0.3.0", about = "Tekton dashboard run correlation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RunKindArg {
    #[value(name = "pipelineruns")]
    PipelineRuns,
    #[value(name = "taskruns")]
    TaskRuns,
}

#[derive(Subcommand)]
enum Commands {
    /// Task list of a PipelineRun snapshot, with placeholders and selection.
    PipelineRun {
        snapshot: PathBuf,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Query string after selecting a task attempt.
    Select {
        snapshot: PathBuf,
        #[arg(long)]
        uid: String,
        #[arg(long)]
        pod: Option<String>,
        #[arg(long)]
        step: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Filtered run list, most recently started first.
    Runs {
        list: PathBuf,
        #[arg(long, value_enum, default_value = "pipelineruns")]
        kind: RunKindArg,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        properties: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    TriggerTemplate {
        template: PathBuf,
        #[arg(long)]
        json: bool,
    },
    ClusterTriggerBinding {
        binding: PathBuf,
        #[arg(long)]
        json: bool,
    },
    ClusterTriggerBindings {
        list: PathBuf,
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    Extensions {
        list: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = command_json_mode(&cli.command);
    let result = run_command(cli.command);
    match result {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", err.to_string(), json!({})));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn run_command(command: Commands) -> Result<Option<Value>> {
    match command {
        Commands::PipelineRun {
            snapshot,
            query,
            json,
        } => {
            let inputs = PipelineRunInputs::load(&snapshot)?;
            let params = parse_query(query.as_deref());
            let page = recompute(&inputs, &params);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "pipeline-run",
                    "page": serde_json::to_value(&page)?
                })));
            }
            print_page(&inputs, &page);
        }
        Commands::Select {
            snapshot,
            uid,
            pod,
            step,
            query,
            json,
        } => {
            let inputs = PipelineRunInputs::load(&snapshot)?;
            let params = parse_query(query.as_deref());
            let page = recompute(&inputs, &params);
            let selected = SelectionId::new(uid, pod);
            let next = select_task(
                page.tasks.iter().filter_map(PipelineRunTask::record),
                &params,
                &selected,
                step.as_deref(),
            )
            .ok_or_else(|| anyhow::anyhow!("no task run matches selection {}", selected))?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "select",
                    "selected": selected.to_string(),
                    "query": next.to_string()
                })));
            }
            println!("query: {}", next);
        }
        Commands::Runs {
            list,
            kind,
            status,
            filters,
            query,
            properties,
            json,
        } => {
            let list_query = build_list_query(query.as_deref(), status.as_deref(), &filters)?;
            let read_only = match &properties {
                Some(path) => DashboardProperties::load(path)?.read_only,
                None => false,
            };
            let create_url = match kind {
                _ if read_only => None,
                RunKindArg::PipelineRuns => {
                    Some(resources::create_pipeline_run_url(&list_query.filters))
                }
                RunKindArg::TaskRuns => Some(resources::create_task_run_url(&list_query.filters)),
            };
            let rows = match kind {
                RunKindArg::PipelineRuns => {
                    let runs: Vec<PipelineRun> = load_list(&list)?;
                    recompute_list(&runs, &list_query)
                        .iter()
                        .map(|run| {
                            let actions = RunActions::for_run(run, read_only);
                            run_row_to_json(run, resources::pipeline_run_url, actions)
                        })
                        .collect::<Vec<_>>()
                }
                RunKindArg::TaskRuns => {
                    let runs: Vec<TaskRun> = load_list(&list)?;
                    recompute_task_run_list(&runs, &list_query)
                        .iter()
                        .map(|run| {
                            let actions = RunActions::for_task_run(run, read_only);
                            run_row_to_json(run, resources::task_run_url, actions)
                        })
                        .collect::<Vec<_>>()
                }
            };
            debug!(rows = rows.len(), status = %list_query.status, "run list computed");
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "runs",
                    "status": list_query.status.as_str(),
                    "filters": list_query.filters.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "create_url": create_url,
                    "runs": rows
                })));
            }
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}",
                    row["name"].as_str().unwrap_or(""),
                    row["status"].as_str().unwrap_or(""),
                    row["started"].as_str().unwrap_or("-"),
                    row["url"].as_str().unwrap_or("")
                );
            }
        }
        Commands::TriggerTemplate { template, json } => {
            let template: TriggerTemplate = read_document(&template)?;
            let params = resources::trigger_template_param_rows(&template);
            let resource_templates = resources::trigger_template_resource_rows(&template);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "trigger-template",
                    "name": template.metadata.name,
                    "params": serde_json::to_value(&params)?,
                    "resource_templates": serde_json::to_value(&resource_templates)?
                })));
            }
            println!("name: {}", template.metadata.name);
            for param in &params {
                println!(
                    "param: {} default={}",
                    param.name,
                    param
                        .default
                        .as_ref()
                        .map(Value::to_string)
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            for row in &resource_templates {
                println!("resource: {} {}", row.kind, row.name);
            }
        }
        Commands::ClusterTriggerBinding { binding, json } => {
            let binding: ClusterTriggerBinding = read_document(&binding)?;
            let params = resources::cluster_trigger_binding_param_rows(&binding);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "cluster-trigger-binding",
                    "name": binding.metadata.name,
                    "params": serde_json::to_value(&params)?
                })));
            }
            println!("name: {}", binding.metadata.name);
            if params.is_empty() {
                println!("params: none");
            }
            for param in &params {
                println!("param: {}={}", param.name, param.value);
            }
        }
        Commands::ClusterTriggerBindings {
            list,
            filters,
            json,
        } => {
            let bindings: Vec<ClusterTriggerBinding> = load_list(&list)?;
            let filters = parse_filters(&filters)?;
            let rows = resources::cluster_trigger_binding_rows(&bindings, &filters);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "cluster-trigger-bindings",
                    "bindings": serde_json::to_value(&rows)?
                })));
            }
            for row in &rows {
                println!("{}\t{}", row.name, row.url);
            }
        }
        Commands::Extensions { list, json } => {
            let extensions: Vec<Extension> = load_list(&list)?;
            let rows = resources::extension_rows(&extensions);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "extensions",
                    "extensions": rows.iter().map(extension_row_to_json).collect::<Vec<_>>()
                })));
            }
            for row in &rows {
                println!("{}\t{}", row.display_name, row.url);
            }
        }
    }
    Ok(None)
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\",\"details\":{{}}}}}}"
        ),
    }
}

fn json_error(code: &str, message: String, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::PipelineRun { json, .. }
        | Commands::Select { json, .. }
        | Commands::Runs { json, .. }
        | Commands::TriggerTemplate { json, .. }
        | Commands::ClusterTriggerBinding { json, .. }
        | Commands::ClusterTriggerBindings { json, .. }
        | Commands::Extensions { json, .. } => *json,
    }
}

fn parse_query(raw: Option<&str>) -> QueryParams {
    raw.map(QueryParams::parse).unwrap_or_default()
}

fn parse_filters(raw: &[String]) -> Result<Vec<LabelFilter>> {
    raw.iter()
        .map(|f| f.parse::<LabelFilter>().map_err(Into::into))
        .collect()
}

/// Page query first; explicit `--status` and `--filter` flags override it.
/// Flags are validated strictly while the page query degrades to defaults.
fn build_list_query(
    query: Option<&str>,
    status: Option<&str>,
    filters: &[String],
) -> Result<RunListQuery> {
    let mut list_query = RunListQuery::from_query(&parse_query(query));
    if let Some(status) = status {
        list_query.status = status.parse::<StatusFilter>()?;
    }
    list_query.filters.extend(parse_filters(filters)?);
    Ok(list_query)
}

fn run_row_to_json<R: RunResource>(
    run: &R,
    url: fn(&str, &str) -> String,
    actions: RunActions,
) -> Value {
    let meta = run.metadata();
    let namespace = meta.namespace.as_deref().unwrap_or("default");
    json!({
        "name": meta.name,
        "namespace": namespace,
        "uid": meta.uid,
        "status": classify(run).as_str(),
        "started": run.start_time(),
        "url": url(namespace, &meta.name),
        "actions": serde_json::to_value(actions).unwrap_or(Value::Null)
    })
}

fn extension_row_to_json(row: &ExtensionRow) -> Value {
    json!({
        "id": row.id,
        "display_name": row.display_name,
        "url": row.url
    })
}

fn print_page(inputs: &PipelineRunInputs, page: &PipelineRunPage) {
    println!("pipeline_run: {}", inputs.pipeline_run.metadata.name);
    println!("status: {}", page.state.as_str());
    for task in &page.tasks {
        let name = task.display_name().unwrap_or("-");
        match task {
            PipelineRunTask::Real { record, task_run } => println!(
                "task: {} {} {}",
                name,
                classify(task_run).as_str(),
                record.pod_name.as_deref().unwrap_or("-")
            ),
            PipelineRunTask::Placeholder(placeholder) => println!(
                "task: {} placeholder ({} steps)",
                name,
                placeholder.steps.len()
            ),
        }
    }
    if let Some(selected) = &page.selected_id {
        println!("selected: {}", selected);
    }
    if let Some(step) = &page.selected_step {
        println!("step: {}", step);
    }
}
