//! Gateway request dispatch server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request ID, trace, timeout, body limit)
//!                         │
//!                         ▼
//!                     dispatch::pipeline
//!                         │  routing::RouteRegistry      (longest prefix)
//!                         │  auth::AuthenticationGate    (JWT + revocation)
//!                         ▼
//!                     proxy::ReverseProxyForwarder ─────────────▶ Downstream
//!                         │                                        Service
//!     Client Response     ▼
//!     ◀────────────── verbatim downstream response, or 401/404/413/502/504
//!
//!     Background: RevocationSweeper, admin API listener, Prometheus exporter
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gateway_dispatch::admin;
use gateway_dispatch::config::load_config;
use gateway_dispatch::lifecycle::{wait_for_signal, Gateway, Shutdown};
use gateway_dispatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gateway-dispatch", version, about = "HTTP gateway: route, authenticate, forward")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "gateway-dispatch starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        downstream_timeout_secs = config.timeouts.downstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = Gateway::build(config)?;
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind(&gateway.config().listener.bind_address).await?;
    let server = tokio::spawn(gateway.server().run(listener, shutdown.subscribe()));

    let admin = match gateway.admin_state() {
        Some(state) => {
            let listener = TcpListener::bind(&gateway.config().admin.bind_address).await?;
            Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
        }
        None => None,
    };

    wait_for_signal().await;
    shutdown.trigger();

    server.await??;
    if let Some(admin) = admin {
        admin.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
