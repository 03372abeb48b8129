//! Chatbox CLI and REST API entry point.
//!
//! Binary name: `chatbox`
//!
//! Loads `.env`, parses CLI arguments, installs tracing, resolves the
//! environment, then starts the REST API server or runs a one-shot command.

mod cli;
mod http;
mod state;

use clap::Parser;

use chatbox_observe::tracing_setup::{
    LogFormat, TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};
use cli::{Cli, Commands};
use state::{AppState, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        format: if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env = Environment::load().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let state = AppState::init(env).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!();
            println!(
                "  {} Chatbox API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}/api")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Voices => {
            cli::voices::list_voices(&env, cli.json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
