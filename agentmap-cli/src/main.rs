//! AgentMap CLI: a thin `clap`-derive shell over the core engine
//! (SPEC_FULL.md §10.4). Subcommands: `run`, `compile`, `scaffold`,
//! `validate-csv`, `validate-config`, `validate-all`, `diagnose`, `config`
//! (spec.md §6 "CLI surface"). Each returns `0` on success, non-zero with a
//! single-line `eprintln!` summary on failure.

mod bundle;
mod csv_loader;
mod log_format;
mod logging;

use agentmap::agent::factory::AgentFactory;
use agentmap::checkpoint::InMemoryCheckpointStore;
use agentmap::graph::assembler::GraphAssembler;
use agentmap::services::registry::ServiceRegistry;
use agentmap::{CompiledGraph, GraphRunner, NodeSpec, StateBag};
use bundle::PersistedBundle;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_APP_NAME: &str = "agentmap";

#[derive(Parser, Debug)]
#[command(name = "agentmap")]
#[command(about = "AgentMap -- compile and run CSV-defined agent graphs")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Verbose: emit debug-level tracing to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config/env namespace under `$XDG_CONFIG_HOME/<app>/config.toml`.
    #[arg(long, global = true, default_value = DEFAULT_APP_NAME)]
    app_name: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a graph from a CSV file and run it to completion or suspension.
    Run(RunArgs),
    /// Assemble a graph and persist its compiled bundle to disk.
    Compile(CompileArgs),
    /// Write a starter CSV template for a new graph.
    Scaffold(ScaffoldArgs),
    /// Parse and assemble every graph in a CSV file without running it.
    ValidateCsv(CsvArgs),
    /// Load and validate the effective AgentMap configuration.
    ValidateConfig,
    /// Run both `validate-csv` and `validate-config`.
    ValidateAll(CsvArgs),
    /// Print effective configuration and CSV/graph summary.
    Diagnose(CsvArgs),
    /// Print the effective AgentMap configuration as JSON.
    Config,
}

#[derive(clap::Args, Debug)]
struct CsvArgs {
    /// Path to the AgentMap CSV file (spec.md §6 "CSV schema").
    #[arg(long, value_name = "PATH")]
    csv: PathBuf,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    csv: CsvArgs,

    /// Graph name to run (required when the CSV defines more than one).
    #[arg(long, value_name = "NAME")]
    graph: Option<String>,

    /// Initial state as a JSON object.
    #[arg(long, value_name = "JSON", default_value = "{}")]
    state: String,

    /// Thread id for suspend/resume correlation.
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// Resume a previously suspended run of `thread_id` with this JSON value.
    #[arg(long, value_name = "JSON")]
    resume: Option<String>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    #[command(flatten)]
    csv: CsvArgs,

    /// Graph name to compile (required when the CSV defines more than one).
    #[arg(long, value_name = "NAME")]
    graph: Option<String>,

    /// Output path for the compiled bundle JSON (a `.src` sidecar is written alongside it).
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ScaffoldArgs {
    /// Output path for the starter CSV.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,

    /// Graph name to scaffold.
    #[arg(long, value_name = "NAME", default_value = "example")]
    graph: String,
}

/// Picks the single named graph out of a CSV's parsed (possibly
/// multi-graph) node sets, defaulting to the lone graph when there is
/// exactly one.
fn select_graph<'a>(
    graphs: &'a BTreeMap<String, Vec<NodeSpec>>,
    requested: Option<&str>,
) -> Result<(&'a str, &'a [NodeSpec]), String> {
    if let Some(name) = requested {
        return graphs
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .ok_or_else(|| format!("no graph named '{name}' in CSV"));
    }
    match graphs.len() {
        0 => Err("CSV defines no graphs".to_string()),
        1 => {
            let (name, nodes) = graphs.iter().next().expect("len == 1");
            Ok((name.as_str(), nodes.as_slice()))
        }
        _ => Err(format!(
            "CSV defines {} graphs ({}); pass --graph to select one",
            graphs.len(),
            graphs.keys().cloned().collect::<Vec<_>>().join(", ")
        )),
    }
}

fn assemble(name: &str, nodes: Vec<NodeSpec>) -> Result<CompiledGraph, String> {
    let factory = AgentFactory::with_builtins();
    let registry = ServiceRegistry::new();
    let assembler = GraphAssembler::new(&factory, &registry);
    assembler.assemble(name, nodes).map_err(|e| e.to_string())
}

async fn cmd_run(args: RunArgs) -> Result<(), String> {
    let graphs = csv_loader::load_csv(&args.csv.csv).map_err(|e| e.to_string())?;
    let (name, nodes) = select_graph(&graphs, args.graph.as_deref())?;
    let graph = assemble(name, nodes.to_vec())?;

    let runner = GraphRunner::new(None, Arc::new(InMemoryCheckpointStore::new()));

    let outcome = if let Some(resume_value) = args.resume.as_deref() {
        let thread_id = args
            .thread_id
            .as_deref()
            .ok_or("--resume requires --thread-id")?;
        let value: serde_json::Value = serde_json::from_str(resume_value)
            .map_err(|e| format!("invalid --resume JSON: {e}"))?;
        runner.resume(&graph, thread_id, value, None).await
    } else {
        let initial: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&args.state)
            .map_err(|e| format!("invalid --state JSON: {e}"))?;
        let state = StateBag::from_map(initial.into_iter().collect());
        runner.run(&graph, state, args.thread_id.clone(), None).await
    };

    match outcome {
        Ok(outcome) => {
            let value = serde_json::json!({
                "state": state_to_json(&outcome.state),
                "summary": outcome.summary,
            });
            print_json(&value, args.pretty);
            Ok(())
        }
        Err(e) if e.is_interrupt() => {
            let value = serde_json::json!({
                "status": "suspended",
                "interrupt": e.to_string(),
            });
            print_json(&value, args.pretty);
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn state_to_json(state: &StateBag) -> serde_json::Value {
    serde_json::Value::Object(state.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn print_json(value: &serde_json::Value, pretty: bool) {
    let s = if pretty {
        serde_json::to_string_pretty(value).expect("json")
    } else {
        serde_json::to_string(value).expect("json")
    };
    println!("{s}");
}

fn cmd_compile(args: CompileArgs) -> Result<(), String> {
    let graphs = csv_loader::load_csv(&args.csv.csv).map_err(|e| e.to_string())?;
    let (name, nodes) = select_graph(&graphs, args.graph.as_deref())?;
    let nodes = nodes.to_vec();
    let graph = assemble(name, nodes.clone())?;
    let persisted = PersistedBundle::from_graph(&graph, &nodes);
    persisted.write(&args.out).map_err(|e| e.to_string())?;
    println!(
        "compiled '{}' ({} nodes) -> {}",
        name,
        persisted.node_count(),
        args.out.display()
    );
    Ok(())
}

fn cmd_scaffold(args: ScaffoldArgs) -> Result<(), String> {
    let template = format!(
        "GraphName,Node,AgentType,Input_Fields,Output_Field,Edge,Success_Next,Failure_Next,Prompt,Description,Context\n\
         {graph},Start,Input,,user_input,Process,,,,Collects the initial message,\n\
         {graph},Process,Default,user_input,result,,Done,Fail,,Does the work,\n\
         {graph},Done,Echo,result,out,,,,,Happy path terminal node,\n\
         {graph},Fail,Failure,,,,,,,Failure terminal node,\n",
        graph = args.graph
    );
    std::fs::write(&args.out, template).map_err(|e| e.to_string())?;
    println!("wrote scaffold graph '{}' -> {}", args.graph, args.out.display());
    Ok(())
}

fn cmd_validate_csv(args: &CsvArgs) -> Result<(), String> {
    let graphs = csv_loader::load_csv(&args.csv).map_err(|e| e.to_string())?;
    if graphs.is_empty() {
        return Err("CSV defines no graphs".to_string());
    }
    for (name, nodes) in &graphs {
        let graph = assemble(name, nodes.clone())?;
        println!("graph '{}': {} nodes, entry '{}', ok", name, graph.len(), graph.entry_point);
    }
    Ok(())
}

fn cmd_validate_config(app_name: &str) -> Result<(), String> {
    let cfg = agentmap_config::AgentMapConfig::load(app_name).map_err(|e| e.to_string())?;
    for (field, value) in [
        ("output_validation", cfg.output_validation.as_str()),
        ("success_policy", cfg.success_policy.as_str()),
        ("checkpoint_backend", cfg.checkpoint_backend.as_str()),
    ] {
        let valid = match field {
            "output_validation" => matches!(value, "ignore" | "warn" | "error"),
            "success_policy" => matches!(value, "all_success" | "at_least_one_success"),
            "checkpoint_backend" => matches!(value, "memory" | "file"),
            _ => true,
        };
        if !valid {
            return Err(format!("invalid config value {field}='{value}'"));
        }
    }
    println!("config ok: {}", serde_json::to_string(&cfg).map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_diagnose(args: &CsvArgs, app_name: &str) -> Result<(), String> {
    let cfg = agentmap_config::AgentMapConfig::load(app_name).map_err(|e| e.to_string())?;
    let graphs = csv_loader::load_csv(&args.csv).map_err(|e| e.to_string())?;
    let registry = ServiceRegistry::new();
    let summary = registry.summary();
    let report = serde_json::json!({
        "config": cfg,
        "graphs": graphs.iter().map(|(name, nodes)| (name.clone(), nodes.len())).collect::<BTreeMap<_, _>>(),
        "registered_services": summary.total_services,
    });
    print_json(&report, true);
    Ok(())
}

fn cmd_config(app_name: &str) -> Result<(), String> {
    let cfg = agentmap_config::AgentMapConfig::load(app_name).map_err(|e| e.to_string())?;
    print_json(&serde_json::to_value(&cfg).map_err(|e| e.to_string())?, true);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    agentmap_config::load_and_apply(&args.app_name, None).ok();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("agentmap: failed to initialize logging: {e}");
    }

    let result = match args.cmd {
        Command::Run(a) => cmd_run(a).await,
        Command::Compile(a) => cmd_compile(a),
        Command::Scaffold(a) => cmd_scaffold(a),
        Command::ValidateCsv(a) => cmd_validate_csv(&a),
        Command::ValidateConfig => cmd_validate_config(&args.app_name),
        Command::ValidateAll(a) => cmd_validate_csv(&a).and_then(|_| cmd_validate_config(&args.app_name)),
        Command::Diagnose(a) => cmd_diagnose(&a, &args.app_name),
        Command::Config => cmd_config(&args.app_name),
    };

    if let Err(e) = result {
        eprintln!("agentmap: {e}");
        std::process::exit(1);
    }
}
