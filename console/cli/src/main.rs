mod presenter;

use anyhow::{Context, Result};
use barq_controller::{ConsoleConfig, FunctionConsole};
use barq_shared::{language_of, ConsoleError, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SEC};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::presenter::TerminalPresenter;

#[derive(Parser)]
#[command(name = "barq", version, about = "Deploy and invoke functions on a Barq backend")]
struct Cli {
    /// Base URL of the Barq API
    #[arg(long, env = "BARQ_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the runtimes the backend offers
    Runtimes,
    /// Deploy a function from a source file
    Deploy(DeployArgs),
    /// Invoke a deployed function with a JSON test event
    Invoke(InvokeArgs),
    /// List deployed functions
    Functions,
    /// Show execution logs of a function
    Logs {
        #[arg(long)]
        name: String,
    },
}

#[derive(Args)]
struct DeployArgs {
    #[arg(long)]
    name: String,
    /// Runtime identifier; defaults to the backend's default runtime
    #[arg(long)]
    runtime: Option<String>,
    #[arg(long, default_value = "main")]
    entrypoint: String,
    /// File containing the function source
    #[arg(long)]
    source: PathBuf,
    #[arg(long, default_value_t = DEFAULT_MEMORY_MB)]
    memory: u32,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SEC)]
    timeout: u32,
}

#[derive(Args)]
struct InvokeArgs {
    #[arg(long)]
    name: String,
    /// Inline JSON event
    #[arg(long, conflicts_with = "event_file")]
    event: Option<String>,
    /// File containing the JSON event
    #[arg(long)]
    event_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.api_url {
        Some(url) => ConsoleConfig::new(url),
        None => ConsoleConfig::from_env(),
    };
    let console = FunctionConsole::from_config(&config, Arc::new(TerminalPresenter))?;

    let outcome = match cli.command {
        Command::Runtimes => runtimes(&console).await,
        Command::Deploy(args) => deploy(&console, args).await?,
        Command::Invoke(args) => invoke(&console, args).await?,
        Command::Functions => functions(&console).await,
        Command::Logs { name } => logs(&console, &name).await,
    };

    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            ExitCode::FAILURE
        }
    })
}

async fn runtimes(console: &FunctionConsole) -> Result<(), ConsoleError> {
    let catalog = console.load_catalog().await?;
    let default = catalog.default_runtime().map(|r| r.value.clone());
    for runtime in catalog.runtimes() {
        let marker = if Some(&runtime.value) == default.as_ref() { "*" } else { " " };
        println!(
            "{} {:<16} {:<20} {:<12} {}",
            marker,
            runtime.value,
            runtime.label,
            runtime.category,
            language_of(&runtime.value)
        );
    }
    Ok(())
}

async fn deploy(console: &FunctionConsole, args: DeployArgs) -> Result<Result<(), ConsoleError>> {
    let source = std::fs::read_to_string(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;

    // A failed catalog load is reported by the presenter; deploy then
    // fails validation for lack of a runtime.
    let _ = console.load_catalog().await;
    if let Some(runtime) = &args.runtime {
        if let Err(e) = console.select_runtime(runtime) {
            presenter::report(&e);
            return Ok(Err(e));
        }
    }

    let draft = console.draft();
    draft.set_name(args.name);
    draft.set_entrypoint(args.entrypoint);
    draft.set_source_code(source);
    draft.set_memory_mb(args.memory);
    draft.set_timeout_sec(args.timeout);

    Ok(console.deploy().await.map(|_| ()))
}

async fn invoke(console: &FunctionConsole, args: InvokeArgs) -> Result<Result<(), ConsoleError>> {
    let event = match (&args.event, &args.event_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => "{}".to_string(),
    };

    Ok(console.invoke_function(&args.name, &event).await.map(|_| ()))
}

async fn functions(console: &FunctionConsole) -> Result<(), ConsoleError> {
    let functions = console.list_functions().await.inspect_err(presenter::report)?;
    if functions.is_empty() {
        println!("No functions deployed");
    }
    for function in functions {
        println!(
            "{:<24} {:<16} {:<16} {}",
            function.func_id,
            function.runtime,
            function.entrypoint,
            function.created_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn logs(console: &FunctionConsole, name: &str) -> Result<(), ConsoleError> {
    let logs = console.function_logs(name).await.inspect_err(presenter::report)?;
    if logs.is_empty() {
        println!("No executions recorded for {}", name);
    }
    for log in logs {
        let status = if log.success { "ok" } else { "error" };
        println!("{} [{}] {}", log.timestamp, status, log.output.trim_end());
    }
    Ok(())
}
