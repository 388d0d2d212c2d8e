use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod cli;

use cli::{Cli, Commands};
use snips_operator::config::{self, IngressMode, OperatorConfig, SecretBackendKind};
use snips_operator::domain::{build_layer, validate_external_url, LifecycleEvent};
use snips_operator::infrastructure::{
    IngressBackend, IngressSource, JujuSecretStore, JujuStatus, KubeSecretStore, PebbleClient,
    RelationIngress, SecretBackend, StaticIngress,
};
use snips_operator::services::ReconcileService;

const REDACTED: &str = "<redacted>";

type Operator = ReconcileService<PebbleClient, SecretBackend, IngressBackend, JujuStatus>;

fn pebble_client(config: &OperatorConfig) -> PebbleClient {
    let client = PebbleClient::new(&config.pebble_binary);
    match config.pebble_socket {
        Some(ref socket) => client.with_socket(socket),
        None => client,
    }
}

fn ingress_backend(config: &OperatorConfig) -> IngressBackend {
    match config.ingress {
        IngressMode::Relation => IngressBackend::Relation(RelationIngress::new(
            config.hook_tools(),
            &config.ingress_relation,
        )),
        IngressMode::Static => IngressBackend::Static(StaticIngress::new(config.ingress_url.clone())),
    }
}

async fn secret_backend(config: &OperatorConfig) -> Result<SecretBackend> {
    let backend = match config.secret_backend {
        SecretBackendKind::Juju => SecretBackend::Juju(JujuSecretStore::new(config.hook_tools())),
        SecretBackendKind::Kubernetes => SecretBackend::Kubernetes(
            KubeSecretStore::infer(&config.namespace, &config.service_name)
                .await
                .context("Failed to set up the Kubernetes secret store")?,
        ),
    };
    Ok(backend)
}

async fn build_operator(config: &OperatorConfig) -> Result<Operator> {
    Ok(ReconcileService::new(
        pebble_client(config),
        secret_backend(config).await?,
        ingress_backend(config),
        JujuStatus::new(config.hook_tools()),
        config.reconcile_settings(),
    ))
}

async fn dispatch(config: &OperatorConfig, event: Option<String>) -> Result<()> {
    let hook = event.context(
        "No event given. Pass the hook name or run under the Juju dispatcher (JUJU_DISPATCH_PATH).",
    )?;
    let event =
        LifecycleEvent::from_dispatch_path(&hook, &config.container_name, &config.ingress_relation);

    let operator = build_operator(config).await?;
    let report = operator
        .handle_event(&event)
        .await
        .with_context(|| format!("Failed to handle {}", event))?;

    match report.failed_task() {
        Some(task) => info!("Reconcile halted at {}: {}", task.name(), report.status),
        None => info!("Reconcile complete: {}", report.status),
    }
    Ok(())
}

async fn print_plan(config: &OperatorConfig) -> Result<()> {
    let ingress_url = ingress_backend(config).url().await;
    if let Some(ref url) = ingress_url {
        if !validate_external_url(url) {
            warn!("Ingress URL is not valid, the unit would be blocked: {}", url);
        }
    }

    let layer = build_layer(&config.workload_settings(), REDACTED, ingress_url.as_deref());
    let yaml = layer.to_yaml().context("Failed to serialize layer")?;
    print!("{}", yaml);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dispatch { event } => {
            let config = config::load(cli.config.as_deref()).await?;
            dispatch(&config, event).await?;
        }
        Commands::Plan => {
            let config = config::load(cli.config.as_deref()).await?;
            print_plan(&config).await?;
        }
        Commands::ValidateUrl { url } => {
            if !validate_external_url(&url) {
                anyhow::bail!("Invalid external URL: {}", url);
            }
            println!("{} is a valid external URL", url);
        }
    }

    Ok(())
}
