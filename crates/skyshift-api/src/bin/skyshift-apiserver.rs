//! Entry point for the Skyshift REST API server (§6).

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use skyshift_api::{app, bootstrap, AppState, Config};
use skyshift_store::Store;

/// Runs the Skyshift control plane's REST API server.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the server config file. Defaults to `$HOME/.skyshift/config.yaml`,
    /// created with a freshly generated secret on first run.
    #[arg(long, env = "SKYSHIFT_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_or_init(&config_path)?;
    let addr = config.bind_addr()?;

    let state = AppState::new(Store::new(), config);
    bootstrap(&state).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "skyshift-apiserver listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
