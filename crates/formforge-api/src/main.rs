//! Formforge CLI and REST API entry point.
//!
//! Binary name: `fforge`
//!
//! Parses CLI arguments, opens the database and wires services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use formforge_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "fforge", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(&state, cli).await;

    shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Form { action } => cli::form::run(state, action, json).await?,
        Commands::Field { action } => cli::field::run(state, action, json).await?,
        Commands::Handler { action } => cli::handler::run(state, action, json).await?,
        Commands::Attributes { form_id, add } => {
            cli::attributes::run(state, &form_id, add, json).await?
        }
        Commands::Submit { form_id, data } => {
            cli::submit::submit(state, &form_id, &data, json).await?
        }
        Commands::Render { form_id, data } => {
            cli::submit::render(state, &form_id, data.as_deref(), json).await?
        }
        Commands::Outbox => cli::outbox::run(state, json).await?,

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Formforge API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {} {}",
                console::style("Data directory:").dim(),
                state.data_dir.display()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
}
