//! Hoist - Move package deployer
//!
//! Usage:
//!   hoist publish [PATH]                     # Publish a new package
//!   hoist upgrade PACKAGE CAP [PATH]         # Upgrade an existing package
//!   hoist address                            # Show the signer's identity

mod prompt;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoist_core::commands::{
    AddressCommand, PublishCommand, PublishOptions, PublishReport, UpgradeCommand, UpgradeOptions,
    UpgradeReport,
};
use hoist_core::config::paths::default_global_dir;
use hoist_core::config::{DeployConfig, SecretText, load_layered};
use hoist_core::context::DeployContext;
use hoist_core::ledger::Network;
use hoist_core::transaction::UpgradePolicy;
use hoist_core::types::{ObjectId, PackageId};
use hoist_core::{Error, RetrySafety};

use crate::prompt::{ConfirmFlow, DeploymentSummary};

/// Environment variable holding the software signer's secret key.
const SECRET_KEY_ENV: &str = "HOIST_SECRET_KEY";

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Publish and upgrade Move packages", long_about = None, version)]
struct Cli {
    /// Config file to use instead of ./hoist.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target network (devnet, testnet, mainnet)
    #[arg(long, global = true)]
    network: Option<String>,

    /// Sign on the hardware device regardless of network
    #[arg(long, global = true)]
    hardware: bool,

    /// Skip all confirmation prompts (for CI/CD)
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and publish a new package
    Publish {
        /// Package directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build and upgrade an existing package
    Upgrade {
        /// Id of the package being upgraded
        package: String,
        /// Id of the package's upgrade capability
        cap: String,
        /// Package directory
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Upgrade policy (compatible, additive, dep-only)
        #[arg(long, default_value = "compatible")]
        policy: String,
    },

    /// Show the identity the configured signer acts as
    Address,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Print nothing on success
    Quiet,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoist=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Dropping the command future stops the compiler, removes the build
    // directory and releases the signing device.
    let outcome = tokio::select! {
        result = run_cli(&cli) => result,
        signal = shutdown_signal() => {
            tracing::warn!(%signal, "abandoning in-flight work");
            Err(anyhow::anyhow!("Stopped by {signal}"))
        }
    };

    if let Err(err) = outcome {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        if let Some(hint) = err.downcast_ref::<Error>().and_then(retry_hint) {
            eprintln!("  {}", style(hint).yellow());
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Resolves with the signal's name once the process is asked to stop.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => return "interrupt",
                    _ = terminate.recv() => return "terminate",
                }
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for SIGTERM"),
        }
    }

    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    "interrupt"
}

fn retry_hint(err: &Error) -> Option<&'static str> {
    match err.retry_safety() {
        RetrySafety::Safe => None,
        RetrySafety::InspectLedgerFirst => Some(
            "The transaction may have reached the ledger. Check its state before retrying.",
        ),
        RetrySafety::Never => Some("This indicates an internal error; retrying will not help."),
    }
}

fn load_config(cli: &Cli) -> Result<DeployConfig> {
    let home_dir = dirs::home_dir().context("Could not determine home directory")?;
    let project_root = std::env::current_dir().context("Could not determine current directory")?;
    let global_dir = default_global_dir(&home_dir);

    let mut config = load_layered(&global_dir, &project_root, cli.config.as_deref())?;

    if let Some(network) = &cli.network {
        config.network = network.parse::<Network>()?;
    }
    if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
        if !secret.trim().is_empty() {
            config.signer.secret_key = Some(SecretText::new(secret.trim()));
        }
    }
    config.validate()?;
    Ok(config)
}

async fn run_cli(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let context = DeployContext::new(config)?.with_force_hardware(cli.hardware);
    let mut flow = ConfirmFlow::new(cli.yes);

    match &cli.command {
        Commands::Publish { path } => {
            let summary = DeploymentSummary {
                action: "Publish",
                network: context.network(),
                signer: context.signer_kind(),
                path: Some(path.clone()),
                package: None,
                policy: None,
            };
            if !flow.confirm_deployment(&summary)? {
                println!("Cancelled.");
                return Ok(());
            }

            let signer = context.signer()?;
            let signer = signer.as_ref();
            let command = PublishCommand::new(context.clone());
            let options = PublishOptions::new(path);
            let (command, options) = (&command, &options);
            let report = with_device_retry(&mut flow, move || {
                command.run_with_signer(signer, options)
            })
            .await?;
            print_publish_result(cli.format, &report)?;
        }
        Commands::Upgrade {
            package,
            cap,
            path,
            policy,
        } => {
            let package_id: PackageId = package
                .parse()
                .with_context(|| format!("Invalid package id: {package}"))?;
            let cap_id: ObjectId = cap
                .parse()
                .with_context(|| format!("Invalid capability id: {cap}"))?;
            let policy: UpgradePolicy = policy.parse()?;

            let summary = DeploymentSummary {
                action: "Upgrade",
                network: context.network(),
                signer: context.signer_kind(),
                path: Some(path.clone()),
                package: Some(package_id.to_short_literal()),
                policy: Some(policy),
            };
            if !flow.confirm_deployment(&summary)? {
                println!("Cancelled.");
                return Ok(());
            }

            let signer = context.signer()?;
            let signer = signer.as_ref();
            let command = UpgradeCommand::new(context.clone());
            let options = UpgradeOptions::new(package_id, cap_id, path).with_policy(policy);
            let (command, options) = (&command, &options);
            let report = with_device_retry(&mut flow, move || {
                command.run_with_signer(signer, options)
            })
            .await?;
            print_upgrade_result(cli.format, &report)?;
        }
        Commands::Address => {
            let signer = context.signer()?;
            let signer = signer.as_ref();
            let command = AddressCommand::new(context.clone());
            let command = &command;
            let report =
                with_device_retry(&mut flow, move || command.run_with_signer(signer)).await?;
            match cli.format {
                OutputFormat::Table => {
                    println!("{}", style(report.identity).bold());
                    println!("  Public key: {}", report.public_key);
                    println!("  Signer:     {}", report.kind);
                    println!("  Network:    {}", report.network);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Quiet => {}
            }
        }
    }
    Ok(())
}

/// Run `op`, offering a retry when it fails on the signing device.
async fn with_device_retry<T, F, Fut>(flow: &mut ConfirmFlow, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = hoist_core::Result<T>>,
{
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if flow.confirm_retry(&err)? {
                    tracing::debug!(error = %err, "retrying after device failure");
                    continue;
                }
                return Err(err.into());
            }
        }
    }
}

fn print_publish_result(format: OutputFormat, report: &PublishReport) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("✓ Published package {}", style(&report.package_id).green());
            match report.upgrade_cap {
                Some(cap) => println!("  Upgrade capability: {}", cap),
                None => println!("  Upgrade capability: (not found)"),
            }
            println!("  Owner:  {}", report.sender);
            println!("  Digest: {}", report.digest);
            for warning in &report.warnings {
                println!("  ⚠ {}", warning);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_upgrade_result(format: OutputFormat, report: &UpgradeReport) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!(
                "✓ Upgraded package {} ({})",
                style(&report.package_id).green(),
                report.policy
            );
            if let Some(new_id) = &report.new_package_id {
                println!("  New version: {}", new_id);
            }
            println!("  Digest: {}", report.digest);
            for warning in &report.warnings {
                println!("  ⚠ {}", warning);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}
