// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Restow Worker Service
//!
//! The restow worker receives batch invocations from the bulk orchestrator
//! and relocates staged blobs to their canonical, content-addressed
//! locations. For each task it:
//!
//! - Extracts the content digest from the staged object key
//! - Resolves the catalogued identities claiming that digest
//! - Validates that the source object carries both recorded checksums
//! - Copies the object to every identity's canonical key, tagging each copy
//! - Optionally deletes the original once every copy has landed

use anyhow::{Context, Result};
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::info;

use restow_worker::RestowWorkerImpl;
use restow_worker::config::WorkerConfig;
use restow_worker::context::ApiContext;
use restow_worker::metrics;

/// Default bind address for the HTTP server.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:7979";

/// Default maximum request body size (bytes).
const DEFAULT_BODY_MAX_BYTES: usize = 1024 * 1024; // envelopes carry one small task

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let buildstamp = option_env!("STAMP").unwrap_or("no-STAMP");
    println!("{} {} ({})", name, version, buildstamp);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --version and --help
    let args: Vec<String> = std::env::args().collect();
    #[allow(clippy::never_loop)] // Intentional: early return on first recognized arg
    for arg in &args[1..] {
        match arg.as_str() {
            "-V" | "--version" => {
                print_version();
                return Ok(());
            }
            "-h" | "--help" => {
                print_version();
                println!("Usage: {} [OPTIONS]", args[0]);
                println!();
                println!("Options:");
                println!("  -h, --help       Display this information");
                println!("  -V, --version    Display the program's version number");
                println!();
                println!("Environment variables:");
                println!(
                    "  BIND_ADDRESS       Server bind address (default: {})",
                    DEFAULT_BIND_ADDRESS
                );
                println!("  SEARCH_ENDPOINT    Search endpoint base URL (required)");
                println!("  SEARCH_INDEX       Index queried for content identities (required)");
                println!("  STORE_ENDPOINT     Object store endpoint base URL (required)");
                println!("  SIGNING_REGION     Region for signed search requests (default: us-east-1)");
                println!("  DELETE_ORIGINALS   Delete originals after all copies land (default: false)");
                println!("  MAX_IDENTITIES     Identity resolution cap per digest (default: 1000)");
                println!("  HTTP_TIMEOUT_SECS  HTTP client timeout in seconds (default: 30)");
                println!("  AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN");
                println!("                     Credentials for signing search requests (optional;");
                println!("                     unsigned requests are sent when absent)");
                println!(
                    "  RUST_LOG           Log filter (default: restow_worker=info,dropshot=info)"
                );
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "restow_worker=info,dropshot=info".to_string()),
        ))
        .init();

    print_version();

    // The rustls crypto provider must be installed before the first reqwest
    // client is built.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    // Load configuration
    let config = WorkerConfig::from_env()?;
    info!("Search endpoint: {}", config.search_endpoint);
    info!("Store endpoint: {}", config.store_endpoint);
    info!("Delete originals: {}", config.delete_originals);

    metrics::register_metrics();

    // Create API context
    let api_context = ApiContext::new(config).context("Failed to create API context")?;

    // Get API description from the trait implementation
    let api = restow_api::restow_worker_api_mod::api_description::<RestowWorkerImpl>()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    // Configure the server
    let bind_address = std::env::var("BIND_ADDRESS")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
        .parse()
        .context("Invalid BIND_ADDRESS")?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: DEFAULT_BODY_MAX_BYTES,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };

    let log = config_logging
        .to_logger("restow-worker")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    // Start the server
    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("Restow worker running on http://{}", bind_address);

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
