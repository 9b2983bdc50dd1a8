//! vitals-assistant-server
//!
//! TCP endpoint for sensor devices. Each connection carries one JSON line
//! (a question or a blood-pressure reading) and gets one text line back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitals_assistant_server::{
    backend::CommandBackend, config::Config, generation::Generator, resolver::Resolver, server,
};

#[derive(Parser, Debug)]
#[command(name = "vitals-assistant-server")]
#[command(about = "Line-delimited JSON assistant server for sensor devices")]
struct Args {
    /// Port to listen on (overrides the PORT environment variable)
    #[arg(long)]
    port: Option<u16>,

    /// Generation program to invoke (overrides LLM_PROGRAM)
    #[arg(long)]
    backend_program: Option<String>,

    /// Model passed to the generation program (overrides LLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait for a request line; 0 disables the deadline
    #[arg(long)]
    read_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args).context("Failed to load configuration")?;

    info!(
        addr = %config.listen_addr,
        program = %config.backend.program,
        model = %config.backend.model,
        timeout = ?config.backend.timeout,
        "Loaded configuration"
    );

    let backend = CommandBackend::from_config(&config.backend);
    let resolver = Arc::new(Resolver::new(Generator::new(backend, config.backend.timeout)));

    server::run(&config, resolver, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
    })
    .await
}

fn load_config(args: Args) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(program) = args.backend_program {
        config.backend.program = program;
    }
    if let Some(model) = args.model {
        config.backend.model = model;
    }
    if let Some(secs) = args.read_timeout_secs {
        config.read_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    Ok(config)
}
