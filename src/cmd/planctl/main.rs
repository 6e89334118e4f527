use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::sync::Arc;

use planwise::internal::{
    exec::executor::execute_plan,
    format::format_result,
    model::client::ModelClient,
    plan::normalize::normalize,
    tools::builtin::scheduling_assistant,
};

#[derive(Parser)]
#[command(name = "planctl")]
#[command(about = "Planwise operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a plan file against the built-in tool registry
    Run {
        /// Path to the plan file (a JSON array of steps)
        #[arg(short, long)]
        plan_file: String,

        /// Output file for the formatted result
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Print the registered tool definitions
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { plan_file, out } => run_plan(plan_file, out).await?,
        Commands::Tools => list_tools()?,
    }

    Ok(())
}

async fn run_plan(plan_file: &str, out: &Option<String>) -> anyhow::Result<()> {
    let contents = fs::read_to_string(plan_file)
        .with_context(|| format!("failed to read plan file {}", plan_file))?;
    let plan = normalize(&contents).context("plan file did not contain a step array")?;

    let model = Arc::new(ModelClient::from_env()?);
    let assistant = scheduling_assistant(model);

    let run = execute_plan(&assistant, &plan).await?;
    let rendered = match run.history.last() {
        Some(value) => format_result(value),
        None => String::new(),
    };

    match out {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("failed to write {}", path))?
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn list_tools() -> anyhow::Result<()> {
    // The registry needs a model client even though listing never calls it.
    let model = Arc::new(ModelClient::from_env()?);
    let assistant = scheduling_assistant(model);

    for definition in assistant.tools.definitions() {
        println!("{}\t{}", definition.name, definition.description);
    }

    Ok(())
}
