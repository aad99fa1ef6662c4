use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use ultron_eye::adapters::{
    Clipboard, CommandClipboard, Deployer, HttpDeployer, HttpDeployerConfig, MemoryClipboard,
    SimulatedDeployer,
};
use ultron_eye::config::WorkflowSettings;
use ultron_eye::kernel::{ConfigWorkflow, WorkflowError};

#[derive(Parser)]
#[command(name = "config-console")]
#[command(about = "Select, validate, and deploy Ultron Eye agent configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON settings file (overrides ULTRON_* environment variables)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Server root to deploy to; deployments are simulated when unset
    #[arg(long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in templates
    Templates,

    /// Print a template or file and its validation findings
    Validate {
        #[command(flatten)]
        source: Source,
    },

    /// Validate and deploy a configuration
    Deploy {
        #[command(flatten)]
        source: Source,
    },

    /// Copy a configuration to the system clipboard
    Copy {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(clap::Args)]
struct Source {
    /// Template to start from
    #[arg(short, long)]
    template: Option<String>,

    /// Configuration file replacing the template text
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    ultron_eye::telemetry::init(ultron_eye::telemetry::DEFAULT_DIRECTIVE)?;

    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(path) => WorkflowSettings::from_json_file(path)?,
        None => WorkflowSettings::from_env()?,
    };
    if let Some(server) = cli.server {
        settings = settings.with_server_url(server);
    }

    match cli.command {
        Commands::Templates => cmd_templates(settings),
        Commands::Validate { source } => cmd_validate(settings, &source).await,
        Commands::Deploy { source } => cmd_deploy(settings, &source).await,
        Commands::Copy { source } => cmd_copy(settings, &source).await,
    }
}

fn cmd_templates(settings: WorkflowSettings) -> Result<()> {
    let workflow = ConfigWorkflow::builder().settings(settings).build()?;
    let default = workflow.templates().default_template().name().to_owned();
    for template in workflow.templates().iter() {
        let marker = if template.name() == default { "*" } else { " " };
        println!("{marker} {:<12} {}", template.name(), template.description());
    }
    Ok(())
}

async fn cmd_validate(settings: WorkflowSettings, source: &Source) -> Result<()> {
    let workflow = open(settings, source).await?;
    println!("{}", workflow.text());
    report(&workflow);
    if workflow.is_valid() {
        Ok(())
    } else {
        bail!("{} validation error(s)", workflow.errors().len())
    }
}

async fn cmd_deploy(settings: WorkflowSettings, source: &Source) -> Result<()> {
    let deployer = deployer_for(&settings)?;
    let mut workflow = open_with(settings, source, |builder| builder.deployer(deployer)).await?;
    report(&workflow);

    let status = match workflow.deploy() {
        Ok(status) => status,
        Err(WorkflowError::ValidationFailed { errors }) => {
            bail!("refusing to deploy: {} validation error(s)", errors.len())
        }
        Err(err) => return Err(err.into()),
    };
    println!("Deploying {}...", status.deployment_id());

    let receipt = tokio::select! {
        outcome = workflow.settle() => outcome.context("no deployment in flight")??,
        _ = tokio::signal::ctrl_c() => {
            workflow.cancel_deploy()?;
            bail!("deployment cancelled");
        }
    };

    println!("Deployed at {}", receipt.accepted_at().to_rfc3339());
    if let Some(message) = receipt.message() {
        println!("{message}");
    }
    for entry in workflow.history().newest_first() {
        println!(
            "  {} {} by {}: {}",
            entry.deployment_id().short(),
            entry.recorded_at().to_rfc3339(),
            entry.operator(),
            entry.description()
        );
    }
    Ok(())
}

async fn cmd_copy(settings: WorkflowSettings, source: &Source) -> Result<()> {
    let clipboard: Arc<dyn Clipboard> = match CommandClipboard::platform_default() {
        Some(clipboard) => Arc::new(clipboard),
        None => Arc::new(MemoryClipboard::new()),
    };
    let mut workflow = open_with(settings, source, |builder| builder.clipboard(clipboard)).await?;

    workflow.copy_to_clipboard().await?;
    if workflow.is_copied() {
        println!("Copied {} bytes", workflow.text().len());
    }
    Ok(())
}

async fn open(settings: WorkflowSettings, source: &Source) -> Result<ConfigWorkflow> {
    open_with(settings, source, |builder| builder).await
}

async fn open_with<F>(settings: WorkflowSettings, source: &Source, customize: F) -> Result<ConfigWorkflow>
where
    F: FnOnce(ultron_eye::kernel::WorkflowBuilder) -> ultron_eye::kernel::WorkflowBuilder,
{
    let mut workflow = customize(ConfigWorkflow::builder().settings(settings)).build()?;
    if let Some(name) = &source.template {
        workflow.try_select_template(name)?;
    }
    if let Some(path) = &source.file {
        workflow.edit_text(read_config(path).await?);
    }
    Ok(workflow)
}

async fn read_config(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

fn deployer_for(settings: &WorkflowSettings) -> Result<Arc<dyn Deployer>> {
    let Some(server) = settings.server_url() else {
        info!(delay = ?settings.deploy_delay(), "no server configured, simulating deployment");
        return Ok(Arc::new(SimulatedDeployer::new(settings.deploy_delay())));
    };

    let mut config = HttpDeployerConfig::new(server)?.with_timeout(settings.request_timeout());
    if let Some(token) = settings.api_token() {
        config = config.with_api_token(token);
    }
    let deployer = HttpDeployer::new(config)?;
    info!(endpoint = %deployer.endpoint(), "deploying to server");
    Ok(Arc::new(deployer))
}

fn report(workflow: &ConfigWorkflow) {
    let template = workflow.active_template().unwrap_or("custom");
    let edited = if workflow.is_modified() { " (edited)" } else { "" };
    if workflow.is_valid() {
        eprintln!("{template}{edited}: valid");
    } else {
        eprintln!("{template}{edited}: {} error(s)", workflow.errors().len());
        for error in workflow.errors() {
            eprintln!("  {error}");
        }
    }
}
