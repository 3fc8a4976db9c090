//! Line-delimited responder daemon: TCP sessions by default, `--console` for stdin/stdout.

mod server;
mod transcript;

use alexandrian_core::CoreConfig;
use server::Shared;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[alexandrian-daemon] .env not loaded: {} (using system environment)", e);
    }

    let console = std::env::args().any(|a| a == "--console");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(console).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(console: bool) -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;
    let registry = alexandrian_sources::build_registry(&config)
        .map_err(|e| format!("HTTP client setup failed: {}", e))?;
    let bind_addr = config.bind_addr.clone();
    tracing::info!(
        app = %config.app_name,
        storage = %config.storage_path,
        sources = ?registry.kinds(),
        "starting"
    );
    let shared = Shared::new(config, registry);

    if console {
        return server::run_console(shared)
            .await
            .map_err(|e| format!("console session failed: {}", e));
    }

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {} failed: {}", bind_addr, e))?;
    tracing::info!("listening on {}", bind_addr);

    tokio::select! {
        result = server::accept_loop(listener, shared) => {
            result.map_err(|e| format!("accept failed: {}", e))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
