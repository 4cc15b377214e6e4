//! Entry point for the Skyshift controller manager process: the skylet
//! supervisor plus the link controller, grounded on
//! `original_source/skyflow/controllers/skylet_controller.py`'s
//! `__main__` and `original_source/skyflow/controllers/link_controller.py`'s.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use skyshift_client::Client;
use skyshift_controller_manager::{AdapterFactory, ClusterAdapter, LinkController, NullAdapter, SkyletSupervisor};

/// Runs the Skyshift controller manager against one API server.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the Skyshift API server, e.g. `http://127.0.0.1:50051`.
    #[arg(long, env = "SKYSHIFT_API_SERVER_URL")]
    api_server_url: String,

    /// Bearer token to authenticate with, if the server requires one.
    #[arg(long, env = "SKYSHIFT_TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut client = Client::new(args.api_server_url);
    if let Some(token) = args.token {
        client = client.with_token(token);
    }

    // No adapter registered for a real backend yet: every cluster gets a
    // no-op adapter until a Kubernetes/Slurm/Ray/cloud one is wired in.
    let adapter_factory: AdapterFactory = Arc::new(|_name: &str| Arc::new(NullAdapter) as Arc<dyn ClusterAdapter>);

    let supervisor = Arc::new(SkyletSupervisor::new(client.clone(), Arc::clone(&adapter_factory)));
    let link_controller = LinkController::new(client, adapter_factory);

    tokio::join!(supervisor.run(), link_controller.run());
    Ok(())
}
