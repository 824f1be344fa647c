//! lp-gateway - HTTP gateway for the LinkPilot publishing workflow

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use liblinkpilot::config::Config;
use liblinkpilot::generator::OpenRouterGenerator;
use liblinkpilot::platform::create_platform;
use liblinkpilot::{logging, Result};
use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "lp-gateway")]
#[command(about = "HTTP gateway for the LinkPilot publishing workflow", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides the configured value)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        logging::LoggingConfig::new(logging::LogFormat::Pretty, "debug".to_string(), true).init();
    } else {
        logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let bind = cli.bind.unwrap_or_else(|| config.gateway.bind.clone());
    let platform = create_platform(&config);
    let generator = Arc::new(OpenRouterGenerator::new(config.generator.clone()));

    if config.linkedin.mock {
        tracing::warn!("mock mode enabled: publish calls will not reach LinkedIn");
    }

    let state = AppState {
        config: Arc::new(config),
        platform,
        generator,
    };

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "gateway listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
