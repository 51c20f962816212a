//! Serve command implementation

use crate::cli::config::load_service_config;
use crate::cli::error::{CliError, CliResult};
use clap::Args;
use registry_admission::http::RegistryServer;
use registry_admission::{AdmissionService, InMemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Serve the admission API over HTTP
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host to bind the server to (overrides configuration)
    #[arg(long, help = "Host to bind the server to")]
    host: Option<String>,

    /// Port to bind the server to (overrides configuration)
    #[arg(long, help = "Port to bind the server to")]
    port: Option<u16>,

    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

pub async fn execute_serve(args: ServeArgs) -> CliResult<()> {
    let mut config = load_service_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    let host = config.http.host.clone();
    let port = config.http.port;
    info!("Starting registry admission server on {}:{}", host, port);

    let service = Arc::new(AdmissionService::new(
        config,
        Arc::new(InMemoryStore::new()),
    )?);
    let server = RegistryServer::new(service, &host, port)?;

    println!("Registry admission server starting...");
    println!("  Listening on: http://{}", server.addr());

    // Blocks until shutdown
    server
        .serve()
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    Ok(())
}
