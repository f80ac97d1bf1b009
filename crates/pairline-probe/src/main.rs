//! Pairline probe binary.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a local server and type commands on stdin
//! pairline-probe --scheme ws --host 127.0.0.1:3000 --user u1 --token secret
//!
//! # Scripted run
//! printf 'online\nstart\n' | pairline-probe -u u1 -t secret --log-level debug
//! ```

use clap::Parser;
use pairline_app::Runtime;
use pairline_probe::{ProbeArgs, ProbeDriver, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ProbeArgs::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    tracing::info!(host = %args.host, user = %args.user, "Pairline probe starting");
    if args.media_url.is_empty() {
        tracing::warn!("No media URL given - matches will fail to join media");
    }

    let env = SystemEnv::new();
    let runtime =
        Runtime::new(ProbeDriver::new(env.clone()), env, args.client_config(), args.credentials());

    runtime.run().await?;

    tracing::info!("Pairline probe stopped");
    Ok(())
}
