//! lp-post - Generate and publish a LinkedIn post from the terminal

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use liblinkpilot::config::Config;
use liblinkpilot::service::{assets, publisher};
use liblinkpilot::{
    logging, ImageAsset, ImageFile, ImageMimeType, LinkpilotError, PublishRequest, Result,
    Session, SessionOrchestrator, SessionState,
};

#[derive(Parser, Debug)]
#[command(name = "lp-post")]
#[command(about = "Generate and publish a LinkedIn post", long_about = None)]
struct Cli {
    /// Topic or source text for the post (reads from stdin if not provided)
    prompt: Option<String>,

    /// Publish the text as-is, skipping AI generation
    #[arg(long)]
    raw: bool,

    /// Image file(s) to attach, in order
    #[arg(short, long)]
    image: Vec<PathBuf>,

    /// Access token (falls back to LINKEDIN_ACCESS_TOKEN)
    #[arg(long, env = "LINKEDIN_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Author URN, e.g. urn:li:person:xxxx (falls back to LINKEDIN_AUTHOR_URN)
    #[arg(long, env = "LINKEDIN_AUTHOR_URN")]
    author_urn: Option<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        logging::LoggingConfig::new(logging::LogFormat::Text, "debug".to_string(), true).init();
    } else {
        logging::LoggingConfig::new(logging::LogFormat::Text, "error".to_string(), false).init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|_| Config::default_config()),
    };

    let prompt = match &cli.prompt {
        Some(prompt) => prompt.clone(),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
    };
    if prompt.is_empty() {
        return Err(LinkpilotError::InvalidInput(
            "No post text provided".to_string(),
        ));
    }

    let stored = match (cli.access_token.clone(), cli.author_urn.clone()) {
        (Some(token), Some(urn)) => Some(Session::restore(token, urn)),
        _ => None,
    };

    let mut orchestrator = SessionOrchestrator::from_config(&config);
    orchestrator.resume_session(stored)?;

    if orchestrator.state() == SessionState::Unauthenticated {
        let url = orchestrator.begin_authorization()?;
        eprintln!("No stored credentials. Authorize LinkPilot first:\n  {}", url);
        return Err(LinkpilotError::InvalidInput(
            "Missing access token or author URN".to_string(),
        ));
    }

    if cli.raw {
        return publish_raw(&orchestrator, &prompt, &cli).await;
    }

    orchestrator.generate(&prompt).await?;
    tracing::debug!(revision = orchestrator.draft().revision, "draft generated");

    if !cli.image.is_empty() {
        orchestrator.select_images(load_images(&cli.image)?)?;
        orchestrator.upload_images().await?;
    }

    let body = orchestrator.draft().body.clone();
    orchestrator.publish().await?;
    report(&cli.format, &body);
    Ok(())
}

/// Publish the prompt text as-is, bypassing draft generation.
async fn publish_raw(
    orchestrator: &SessionOrchestrator,
    content: &str,
    cli: &Cli,
) -> Result<()> {
    let session = orchestrator
        .session()
        .cloned()
        .ok_or_else(|| LinkpilotError::InvalidInput("Missing credentials".to_string()))?;
    let platform = orchestrator.platform();

    let mut batch: Vec<ImageAsset> = load_images(&cli.image)?
        .into_iter()
        .map(ImageAsset::selected)
        .collect();
    if !batch.is_empty() {
        assets::prepare_all(platform.as_ref(), &session, &mut batch).await?;
    }

    let request = PublishRequest {
        body: content.to_string(),
        author_urn: session.author_urn.clone(),
        asset_urns: batch.iter().filter_map(|a| a.asset_urn.clone()).collect(),
    };
    publisher::publish(platform.as_ref(), &session, &request).await?;
    report(&cli.format, content);
    Ok(())
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<ImageFile>> {
    paths
        .iter()
        .map(|path| {
            let mime_type = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageMimeType::from_extension)
                .ok_or_else(|| {
                    LinkpilotError::InvalidInput(format!(
                        "Unsupported image type: {}",
                        path.display()
                    ))
                })?;
            let data = std::fs::read(path)?;
            Ok(ImageFile {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string()),
                mime_type,
                data,
            })
        })
        .collect()
}

fn report(format: &str, body: &str) {
    if format == "json" {
        println!(
            "{}",
            serde_json::json!({ "message": "Post created successfully", "content": body })
        );
    } else {
        println!("Post created successfully.");
    }
}
