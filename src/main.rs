mod app;
mod cli;
mod config;
mod gateway;
mod routes;
mod session;
mod ui;
mod workflow;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = config::AppConfig::from_env();
    let app = app::App::new(&config);

    match cli.command {
        Some(cli::Command::Login { token, name }) => app.run_login(token, name),
        Some(cli::Command::Logout) => app.run_logout(),
        Some(cli::Command::Analyze { path }) => app.run_analyze(&path).await,
        None => app.run_interactive().await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
