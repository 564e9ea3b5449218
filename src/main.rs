//! # InfluxDB Secret Controller
//!
//! One-shot job: converge the declared InfluxDB tokens into labeled
//! Kubernetes Secrets, then exit. Scheduling (e.g. a `CronJob`) and mutual
//! exclusion of runs are left to the caller.
//!
//! ```bash
//! # Reconcile (default)
//! influxdb-secret-controller
//!
//! # Show what a run would create and delete
//! influxdb-secret-controller plan
//!
//! # Validate the desired-state file only
//! influxdb-secret-controller check --config ./config.yml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use influxdb_secret_controller::config::{load_desired_entries, ControllerConfig};
use influxdb_secret_controller::controller::reconciler::{run, ReconcileOptions, Reconciler};
use influxdb_secret_controller::observability::metrics;
use influxdb_secret_controller::provider::influxdb::InfluxClient;
use influxdb_secret_controller::provider::kubernetes::KubeSecretStore;
use influxdb_secret_controller::provider::{DirectoryClient, SecretStore};
use kube::Client;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// InfluxDB token to Kubernetes Secret reconciler
#[derive(Parser)]
#[command(name = "influxdb-secret-controller", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Desired-state file (overrides CONFIG_PATH)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overrides DEBUG)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile InfluxDB tokens and Secrets
    Run,
    /// List the Secrets a run would create and delete, without changing anything
    Plan,
    /// Validate the desired-state file without contacting any API
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = ControllerConfig::from_env();
    if let Some(path) = cli.config {
        config.config_path = path;
    }
    config.debug |= cli.debug;

    // Must happen before any TLS connection is made
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    let default_directive = if config.debug {
        "influxdb_secret_controller=debug"
    } else {
        "influxdb_secret_controller=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .init();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_once(&config).await,
        Commands::Plan => plan(&config).await,
        Commands::Check => check(&config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn connect(
    config: &ControllerConfig,
) -> Result<(Arc<dyn DirectoryClient>, Arc<dyn SecretStore>)> {
    if config.influxdb_token.is_empty() {
        warn!("INFLUXDB_TOKEN is empty; InfluxDB requests will likely be rejected");
    }

    let influx = InfluxClient::from_config(config).context("Failed to create InfluxDB client")?;
    info!("Using InfluxDB at {}", influx.base_url());

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let store = KubeSecretStore::new(client, &config.deployment_name, config.secret_list_page_size);

    Ok((Arc::new(influx), Arc::new(store)))
}

async fn run_once(config: &ControllerConfig) -> Result<ExitCode> {
    metrics::register_metrics().context("Failed to register metrics")?;

    // Fails fast on a bad desired-state file before any client is built
    load_desired_entries(&config.config_path)?;

    let (directory, store) = connect(config).await?;
    let outcome = run(config, directory, store).await;

    if let Some(path) = &config.metrics_textfile {
        if let Err(e) = metrics::write_textfile(path) {
            warn!("Failed to export metrics: {e:#}");
        }
    }

    let report = outcome.context("Reconciliation failed")?;
    info!("Reconciliation finished: {report}");

    for skipped in &report.skipped {
        warn!("Skipped {skipped}");
    }
    for failure in &report.failures {
        error!("Failed {failure}");
    }

    Ok(if report.failed() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn plan(config: &ControllerConfig) -> Result<ExitCode> {
    let desired = load_desired_entries(&config.config_path)?;
    let (directory, store) = connect(config).await?;

    let options = ReconcileOptions {
        revoke_stale_tokens: config.revoke_stale_tokens,
    };
    let planned = Reconciler::new(directory, store, options)
        .plan(&desired)
        .await
        .context("Failed to compute plan")?;

    for entry in &planned.needed {
        println!(
            "+ {}/{} (org {}, {}{})",
            entry.namespace,
            entry.name,
            entry.org,
            entry.permissions,
            entry
                .bucket
                .as_ref()
                .map(|bucket| format!(", bucket {bucket}"))
                .unwrap_or_default()
        );
    }
    for secret in &planned.stale {
        println!("- {}/{}", secret.namespace, secret.name);
    }
    if planned.is_empty() {
        println!("Nothing to do");
    }

    Ok(ExitCode::SUCCESS)
}

fn check(config: &ControllerConfig) -> Result<ExitCode> {
    let desired = load_desired_entries(&config.config_path)?;
    println!(
        "{}: {} valid entries",
        config.config_path.display(),
        desired.len()
    );
    Ok(ExitCode::SUCCESS)
}
