//! Slipway CLI - deployment harness for an HTTP analysis service
//!
//! This CLI gives operators a terminal interface to:
//! - Run the full deployment pipeline (certificates, build, start,
//!   verify, reconcile)
//! - Verify endpoint health on its own
//! - Reconcile the editor configuration entry on its own

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod output;
mod prompt;

use config::CliConfig;
pub use error::{CliError, CliResult};
use output::{print_error, print_success, print_summary, print_warning};
use prompt::TerminalPrompt;

use slipway_certs::CertificateStore;
use slipway_health::{Backoff, HealthVerifier, RetryPolicy};
use slipway_pipeline::{
    DeploymentOrchestrator, DeploymentPlan, ProcessComposeRunner, RunOptions,
};
use slipway_reconcile::{ConfigReconciler, PathResolver, ReconcileOptions};
use slipway_types::{EndpointProbe, ServiceDescriptor};

const DEFAULT_SERVICE_NAME: &str = "style-analyzer";
const DEFAULT_SERVICE_URL: &str = "https://localhost/mcp";
const DEFAULT_SUBJECT: &str = "localhost";
const DEFAULT_CERT_DIR: &str = "certs";
const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
const DEFAULT_SIGNAL: &str = "healthy";
const PROXY_HEALTH_URL: &str = "https://localhost/health";
const APP_HEALTH_URL: &str = "http://localhost:8000/health";

/// Slipway CLI application
#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Slipway - single-host deployment harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SLIPWAY_CONFIG")]
    config: Option<String>,

    /// Quiet, non-interactive mode: no prompts, warnings-only logging
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by deploy and reconcile
#[derive(Args, Debug, Clone)]
struct EntryArgs {
    /// Service entry name
    #[arg(long)]
    name: Option<String>,

    /// Service endpoint URL
    #[arg(long)]
    url: Option<String>,

    /// Overwrite a conflicting entry without asking
    #[arg(short, long)]
    force: bool,

    /// Merge over an existing entry
    #[arg(short, long)]
    merge: bool,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run the full deployment pipeline
    Deploy {
        #[command(flatten)]
        entry: EntryArgs,

        /// Skip the external build stage
        #[arg(long)]
        skip_build: bool,

        /// Skip configuration reconciliation
        #[arg(long)]
        skip_config: bool,

        /// Compose file for the external runner
        #[arg(long)]
        compose_file: Option<PathBuf>,

        /// Certificate subject name
        #[arg(long)]
        subject: Option<String>,
    },

    /// Probe service endpoints without deploying
    Verify {
        /// Endpoint URL (repeatable); defaults to the harness endpoints
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Required marker in a healthy response body
        #[arg(long, default_value = DEFAULT_SIGNAL)]
        signal: String,

        /// Accept self-signed certificates
        #[arg(long)]
        insecure: bool,

        /// Attempts per endpoint
        #[arg(long)]
        attempts: Option<u32>,

        /// Delay between attempts, in seconds
        #[arg(long)]
        delay_secs: Option<u64>,
    },

    /// Reconcile the editor configuration entry without deploying
    Reconcile {
        #[command(flatten)]
        entry: EntryArgs,

        /// Registry document path (defaults to the editor's location)
        #[arg(long)]
        registry_path: Option<PathBuf>,

        /// Leave the editor settings document alone
        #[arg(long)]
        skip_settings: bool,
    },

    /// Show resolved configuration
    Config,
}

/// Run using the current process arguments.
///
/// Returns the process exit code: 0 on a complete run, non-zero when
/// any stage failed.
pub async fn run() -> CliResult<i32> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.quiet);

    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Deploy {
            entry,
            skip_build,
            skip_config,
            compose_file,
            subject,
        } => {
            deploy(
                &config,
                entry,
                skip_build,
                skip_config,
                compose_file,
                subject,
                cli.quiet,
            )
            .await
        }
        Commands::Verify {
            urls,
            signal,
            insecure,
            attempts,
            delay_secs,
        } => verify(&config, urls, signal, insecure, attempts, delay_secs).await,
        Commands::Reconcile {
            entry,
            registry_path,
            skip_settings,
        } => reconcile(&config, entry, registry_path, skip_settings, cli.quiet),
        Commands::Config => {
            println!("service name:  {}", service_name(&config, &None));
            println!("service url:   {}", service_url(&config, &None));
            println!(
                "subject:       {}",
                config.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
            );
            println!("compose file:  {}", compose_file_path(&config, None).display());
            let resolver = PathResolver::for_current_platform()?;
            println!("registry:      {}", resolver.server_registry_path().display());
            println!("settings:      {}", resolver.editor_settings_path().display());
            Ok(0)
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn service_name(config: &CliConfig, flag: &Option<String>) -> String {
    flag.clone()
        .or_else(|| config.service_name.clone())
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.into())
}

fn service_url(config: &CliConfig, flag: &Option<String>) -> String {
    flag.clone()
        .or_else(|| config.service_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.into())
}

fn compose_file_path(config: &CliConfig, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| config.compose_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPOSE_FILE))
}

fn retry_policy(config: &CliConfig, attempts: Option<u32>, delay_secs: Option<u64>) -> RetryPolicy {
    let defaults = RetryPolicy::default();
    RetryPolicy {
        max_attempts: attempts.or(config.max_attempts).unwrap_or(defaults.max_attempts),
        backoff: Backoff::Fixed(Duration::from_secs(
            delay_secs.or(config.retry_delay_secs).unwrap_or(2),
        )),
    }
}

fn default_probes(signal: &str) -> Vec<EndpointProbe> {
    vec![
        // The proxy serves the self-signed bundle this harness provisions.
        EndpointProbe::self_signed(PROXY_HEALTH_URL, signal),
        EndpointProbe::new(APP_HEALTH_URL, signal),
    ]
}

/// Settings keys this integration owns in the editor settings document.
fn settings_entries() -> Map<String, Value> {
    let mut entries = Map::new();
    entries.insert("chat.mcp.enabled".into(), Value::Bool(true));
    entries
}

fn reconciler_for(entry: &EntryArgs, quiet: bool) -> ConfigReconciler {
    let options = ReconcileOptions {
        force: entry.force,
        merge: entry.merge,
    };
    let reconciler = ConfigReconciler::new(options);
    if quiet {
        reconciler
    } else {
        reconciler.with_prompt(Arc::new(TerminalPrompt))
    }
}

async fn deploy(
    config: &CliConfig,
    entry: EntryArgs,
    skip_build: bool,
    skip_config: bool,
    compose_file: Option<PathBuf>,
    subject: Option<String>,
    quiet: bool,
) -> CliResult<i32> {
    let subject = subject
        .or_else(|| config.subject.clone())
        .unwrap_or_else(|| DEFAULT_SUBJECT.into());
    let cert_dir = config
        .cert_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CERT_DIR));
    let resolver = PathResolver::for_current_platform()?;

    let descriptor =
        ServiceDescriptor::http(service_name(config, &entry.name), service_url(config, &entry.url));

    let plan = DeploymentPlan {
        subject,
        descriptor,
        registry_path: resolver.server_registry_path(),
        settings_path: Some(resolver.editor_settings_path()),
        settings_entries: settings_entries(),
        probes: default_probes(DEFAULT_SIGNAL),
    };

    info!(
        service = %plan.descriptor.name,
        subject = %plan.subject,
        "starting deployment pipeline"
    );

    let runner = ProcessComposeRunner::new(compose_file_path(config, compose_file)).quiet(quiet);
    let verifier = HealthVerifier::new(retry_policy(config, None, None))?;
    let reconciler = reconciler_for(&entry, quiet);

    let mut orchestrator = DeploymentOrchestrator::new(
        CertificateStore::new(cert_dir),
        Arc::new(runner),
        verifier,
        reconciler,
        plan,
        RunOptions {
            skip_build,
            skip_config,
        },
    );

    let report = orchestrator.run().await;
    print_summary(&report);
    Ok(if report.succeeded() { 0 } else { 1 })
}

async fn verify(
    config: &CliConfig,
    urls: Vec<String>,
    signal: String,
    insecure: bool,
    attempts: Option<u32>,
    delay_secs: Option<u64>,
) -> CliResult<i32> {
    let probes: Vec<EndpointProbe> = if urls.is_empty() {
        default_probes(&signal)
    } else {
        urls.into_iter()
            .map(|url| {
                if insecure {
                    EndpointProbe::self_signed(url, signal.as_str())
                } else {
                    EndpointProbe::new(url, signal.as_str())
                }
            })
            .collect()
    };

    let verifier = HealthVerifier::new(retry_policy(config, attempts, delay_secs))?;
    let results = verifier.probe_all(&probes).await;

    let mut all_healthy = true;
    for result in &results {
        if result.is_healthy() {
            print_success(&format!(
                "{} healthy after {} attempt(s)",
                result.endpoint, result.attempts
            ));
        } else {
            all_healthy = false;
            let cause = result.last_error.as_deref().unwrap_or("unknown");
            print_error(&format!(
                "{} {} after {} attempt(s): {}",
                result.endpoint, result.status, result.attempts, cause
            ));
        }
    }
    Ok(if all_healthy { 0 } else { 1 })
}

fn reconcile(
    config: &CliConfig,
    entry: EntryArgs,
    registry_path: Option<PathBuf>,
    skip_settings: bool,
    quiet: bool,
) -> CliResult<i32> {
    let resolver = PathResolver::for_current_platform()?;
    let registry_path = registry_path.unwrap_or_else(|| resolver.server_registry_path());

    let descriptor =
        ServiceDescriptor::http(service_name(config, &entry.name), service_url(config, &entry.url));
    let reconciler = reconciler_for(&entry, quiet);

    info!(
        service = %descriptor.name,
        registry = %registry_path.display(),
        "reconciling editor configuration"
    );

    let result = reconciler.reconcile_servers(&registry_path, &descriptor)?;
    report_reconcile(&registry_path, &result);

    if !skip_settings {
        let settings_path = resolver.editor_settings_path();
        let result = reconciler.reconcile_settings(&settings_path, &settings_entries())?;
        report_reconcile(&settings_path, &result);
    }
    Ok(0)
}

fn report_reconcile(path: &Path, result: &slipway_reconcile::ReconcileResult) {
    if let Some(backup) = &result.backup {
        print_success(&format!("backup created: {}", backup.backup_path.display()));
    }
    if result.lossy {
        print_warning(&format!(
            "{}: previous content could not be preserved (see backup)",
            path.display()
        ));
    }
    if result.changed {
        print_success(&format!("updated {}", path.display()));
    } else {
        print_success(&format!("{} already up to date", path.display()));
    }
}
