//! Entry point for the Skyshift scheduler controller process.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use skyshift_client::Client;
use skyshift_scheduler::SchedulerController;

/// Runs the Skyshift scheduler controller against one API server.
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

    SchedulerController::new(client).run().await?;
    Ok(())
}
