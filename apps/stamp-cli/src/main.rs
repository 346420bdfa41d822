//! Signature stamping CLI
//!
//! Drives one editor session end to end: load the PDF and signature, stamp
//! a draft preview, project the signature onto every page, apply per-page
//! adjustments, and write the final document.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use stamp_client::{GatewayConfig, HttpStampGateway};
use stamp_core::{
    EditorSession, PlacementPatch, SourceFile, StampGateway, CONNECTIVITY_MESSAGE,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod pdf_info;

use cli::{image_content_type, Cli, Command, SignArgs};

const DEFAULT_LOG_FILTER: &str = "stamp_cli=info,stamp_core=info,stamp_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let gateway = HttpStampGateway::new(config)?;

    match cli.command {
        Command::Health => health(&gateway).await,
        Command::Sign(args) => sign(&gateway, args).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    let config = match path {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    let config = config.with_env_overrides()?;
    tracing::info!(
        base_url = %config.base_url,
        timeout_secs = config.timeout_secs,
        "gateway configured"
    );
    Ok(config)
}

async fn health(gateway: &HttpStampGateway) -> Result<()> {
    let url = &gateway.config().base_url;
    if !gateway.health().await {
        bail!("{} ({})", CONNECTIVITY_MESSAGE, url);
    }
    println!("Stamping service reachable at {}", url);
    Ok(())
}

fn read_source(path: &Path, content_type: &str) -> Result<SourceFile> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, content_type, bytes))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

async fn sign(gateway: &HttpStampGateway, args: SignArgs) -> Result<()> {
    let mut session = EditorSession::new();
    session.set_scale(args.zoom)?;
    session.load_pdf(read_source(&args.pdf, "application/pdf")?);
    session.load_image(read_source(&args.image, image_content_type(&args.image))?);

    if !session.refresh_health(gateway).await {
        bail!("{} ({})", CONNECTIVITY_MESSAGE, gateway.config().base_url);
    }

    // Draft on page 1
    let id = session.add_signature()?;
    if let Some(bounds) = args.at {
        session.update_signature(id, &PlacementPatch::bounds(bounds));
    }

    session
        .stamp_pdf(gateway)
        .await
        .context("Failed to stamp the draft preview")?;

    let Some(preview) = session.preview_artifact() else {
        bail!("Stamping returned no preview");
    };
    let total_pages = pdf_info::page_count(preview.bytes())?;
    if let Some(path) = &args.preview_out {
        write_output(path, preview.bytes())?;
        tracing::info!(path = %path.display(), "wrote preview");
    }

    // Every page starts from the draft placement
    session.on_preview_pages_loaded(total_pages);
    for page_override in &args.pages {
        let Some(id) = session.projection().page(page_override.page).map(|p| p.id()) else {
            tracing::warn!(
                page = page_override.page,
                total_pages,
                "ignoring placement for a page the document does not have"
            );
            continue;
        };
        session.update_page_signature(id, &PlacementPatch::bounds(page_override.bounds));
    }

    session
        .save_final_pdf(gateway)
        .await
        .context("Failed to save the signed PDF")?;

    let Some(document) = session.take_final_artifact() else {
        bail!("Stamping returned no final document");
    };
    write_output(&args.out, document.bytes())?;
    println!(
        "Signed {} page(s), wrote {}",
        total_pages,
        args.out.display()
    );
    Ok(())
}
