//! as3d - keeps a BIG-IP appliance on the desired AS3 declaration

use as3_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// AS3 sync daemon CLI
#[derive(Parser)]
#[command(name = "as3d")]
#[command(about = "AS3 sync daemon - reconciles desired state onto an appliance", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AS3D_CONFIG")]
    config: Option<String>,

    /// Desired state file (overrides source.desired_state)
    #[arg(short, long, env = "AS3D_DESIRED_STATE")]
    desired_state: Option<String>,

    /// Log level (overrides logging.level)
    #[arg(long, env = "AS3D_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "AS3D_LOG_JSON")]
    json: bool,

    /// Delete these partitions and exit
    #[arg(long = "delete-partition", value_name = "NAME")]
    delete_partitions: Vec<String>,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;
    if let Some(path) = cli.desired_state {
        config.source.desired_state = Some(path.into());
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        appliance = %config.appliance.url,
        "Starting as3d"
    );

    let server = Server::new(config)?;
    let result = if cli.delete_partitions.is_empty() {
        server.run().await
    } else {
        server.delete_partitions(&cli.delete_partitions).await
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "as3d stopped");
    }
    result
}
