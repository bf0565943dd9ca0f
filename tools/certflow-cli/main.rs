use certflow::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use tracing_subscriber::EnvFilter;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TemplateCli {
    Blank,
    Standard,
}

/// Inspect and scaffold certificate workflow documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log more detail (equivalent to RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the workflow as a tree
    Show {
        /// Path to the workflow JSON document
        path: String,
        /// Append node ids to each line
        #[arg(long)]
        ids: bool,
    },
    /// Check that every node is configured; exits non-zero otherwise
    Validate { path: String },
    /// List the variables a condition at the given node may reference
    Outputs { path: String, node_id: String },
    /// Show a Condition node's expression as editor rows
    Conditions { path: String, node_id: String },
    /// Evaluate a Condition node's guard against variable values
    Eval {
        path: String,
        node_id: String,
        /// Variable value as `<nodeId>#<output>#<type>=<value>`; repeatable
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },
    /// Print a new workflow document
    New {
        #[arg(short, long, value_enum, default_value = "standard")]
        template: TemplateCli,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Show { path, ids } => {
            let workflow = load_workflow(&path);
            let display = workflow.display();
            if ids {
                print!("{}", display.with_ids());
            } else {
                print!("{}", display);
            }
        }
        Command::Validate { path } => run_validate(&path),
        Command::Outputs { path, node_id } => run_outputs(&path, &node_id),
        Command::Conditions { path, node_id } => run_conditions(&path, &node_id),
        Command::Eval {
            path,
            node_id,
            vars,
        } => run_eval(&path, &node_id, &vars),
        Command::New { template } => {
            let template = match template {
                TemplateCli::Blank => Template::Blank,
                TemplateCli::Standard => Template::Standard,
            };
            let json = Workflow::from_template(template)
                .to_json_pretty()
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode workflow: {}", e)));
            println!("{}", json);
        }
    }
}

fn run_validate(path: &str) {
    let workflow = load_workflow(path);
    match workflow.first_unvalidated() {
        None => println!("All {} nodes are configured.", workflow.len()),
        Some(node) => exit_with_error(&format!(
            "Node '{}' ({}, #{}) is not configured",
            node.name, node.node_type, node.id
        )),
    }
}

fn run_outputs(path: &str, node_id: &str) {
    let workflow = load_workflow(path);
    let outputs = workflow
        .outputs_before(&NodeId::from(node_id))
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if outputs.is_empty() {
        println!("No outputs are available before node '{}'.", node_id);
        return;
    }
    for entry in &outputs {
        println!("{} [{}]", entry.node.name, entry.node.node_type);
        for variable in entry.variables() {
            println!("  {:<28} {}", variable.label, variable.selector.key());
        }
    }
}

fn run_conditions(path: &str, node_id: &str) {
    let node = load_condition(path, node_id);
    let expression = node
        .expression()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let form = expr_to_form_values(expression.as_ref())
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let json = serde_json::to_string_pretty(&form)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode form: {}", e)));
    println!("{}", json);
}

fn run_eval(path: &str, node_id: &str, vars: &[String]) {
    let node = load_condition(path, node_id);
    let expression = match node.expression() {
        Ok(Some(expr)) => expr,
        Ok(None) => exit_with_error(&format!("Node '{}' has no condition", node_id)),
        Err(e) => exit_with_error(&e.to_string()),
    };

    let mut variables = Variables::new();
    for raw in vars {
        let (key, value) = raw
            .split_once('=')
            .unwrap_or_else(|| exit_with_error(&format!("Expected KEY=VALUE, got '{}'", raw)));
        let selector =
            Selector::parse_key(key).unwrap_or_else(|e| exit_with_error(&e.to_string()));
        let value = Value::parse_as(value, selector.value_type).unwrap_or_else(|| {
            exit_with_error(&format!(
                "'{}' is not a valid {} value",
                value, selector.value_type
            ))
        });
        variables.insert(&selector, value);
    }

    println!("{}", expression);
    match expression.is_satisfied(&variables) {
        Ok(result) => println!("  -> {}", result),
        Err(e) => exit_with_error(&format!("Evaluation failed: {}", e)),
    }
}

fn load_workflow(path: &str) -> Workflow {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read workflow file '{}': {}", path, e))
    });
    Workflow::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)))
}

fn load_condition(path: &str, node_id: &str) -> Node {
    let workflow = load_workflow(path);
    let node = workflow
        .find_node(&NodeId::from(node_id))
        .unwrap_or_else(|| exit_with_error(&format!("Node '{}' not found", node_id)));
    if node.node_type != NodeType::Condition {
        exit_with_error(&format!(
            "Node '{}' is a {} node, not a condition",
            node_id, node.node_type
        ));
    }
    node.clone()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
