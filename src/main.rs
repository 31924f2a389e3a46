//! # Replay
//!
//! Replays a transaction in the external simulator and reports security boundary violations.
use clap::Parser;
use replay::cli::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    // stdout carries the job report
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy())
        .init();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, no longer waiting for the simulation");
            ctrl_c.cancel();
        }
    });

    let args = Args::parse();
    if let Err(err) = args.run(cancel).await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
