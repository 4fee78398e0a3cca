use std::sync::Arc;

use clap::Parser;
use tracing::info;

use inventrack_core::Config;
use inventrack_server::cli::{CliArgs, Command};
use inventrack_server::{build_router, startup, AppState};

fn load_config() -> Config {
    inventrack_core::config::load_dotenv();
    Config::from_env()
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    config.log_summary();

    let state = startup::build_app_state(config);

    // Restore in the background so a slow or dead database never delays bind.
    let restore_state = state.clone();
    tokio::spawn(async move {
        startup::restore_from_config(&restore_state).await;
    });

    let app = build_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown(&state).await;
    Ok(())
}

async fn shutdown(state: &Arc<AppState>) {
    info!("Shutting down");
    state.connections.close().await;
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl_c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {}", e);
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config();

    match args.command() {
        Command::Serve => serve(&config).await?,
        Command::Status => {
            let store = startup::config_store(&config);
            println!("config file:   {}", store.path().display());
            println!("isConfigured:  {}", store.is_configured());
        }
        Command::Reset => {
            let store = startup::config_store(&config);
            store.clear()?;
            println!("Removed {} (setup will run again on next start)", store.path().display());
        }
    }

    Ok(())
}
