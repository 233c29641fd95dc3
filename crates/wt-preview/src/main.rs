use std::sync::Arc;
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wt_core::{AspectRatio, GenerationRequest, IdempotencyKey, Quality};
use wt_preview::{CancelToken, EventSink, PreviewConfig, PreviewEvent, PreviewGenerator};

#[derive(Debug, Parser)]
#[command(name = "wondertone-preview", version, about = "Generate art style previews for a photo")]
struct Cli {
    /// Source image URL or data URI
    #[arg(long)]
    image: String,

    /// Catalog style id; repeat to preview several styles at once
    #[arg(long = "style", required = true)]
    styles: Vec<String>,

    #[arg(long, default_value_t = AspectRatio::Square.to_string())]
    aspect_ratio: String,

    #[arg(long, default_value_t = Quality::Auto)]
    quality: Quality,

    /// Request previews without a watermark (entitled users only)
    #[arg(long)]
    no_watermark: bool,

    #[arg(long)]
    authenticated: bool,

    #[arg(long)]
    photo_id: Option<String>,

    /// Overrides WONDERTONE_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides WONDERTONE_POLL_MAX_ATTEMPTS
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = PreviewConfig::load().context("failed to load preview configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.schedule.max_attempts = max_attempts;
        config.schedule.validate().map_err(anyhow::Error::msg)?;
    }

    let now = Utc::now();
    let requests = cli
        .styles
        .iter()
        .enumerate()
        .map(|(iteration, style)| {
            let mut builder = GenerationRequest::builder(cli.image.clone(), style.clone())
                .aspect_ratio(&cli.aspect_ratio)
                .quality(cli.quality)
                .watermark(!cli.no_watermark)
                .authenticated(cli.authenticated)
                .idempotency_key(IdempotencyKey::for_attempt(style, now, iteration as u32));
            if let Some(photo_id) = &cli.photo_id {
                builder = builder.photo_id(photo_id.clone());
            }
            builder.build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (events, mut rx) = EventSink::channel();
    let generator = Arc::new(PreviewGenerator::from_config(&config)?.with_events(events));

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                PreviewEvent::Phase { style, phase, .. } => info!("[{}] {}", style, phase.label()),
                PreviewEvent::StatusChecked { request_id, attempt, status } => {
                    info!("[{}] attempt {}: {}", request_id, attempt, status)
                }
            }
        }
    });

    let cancel = CancelToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling previews");
            on_ctrl_c.cancel();
        }
    });

    let results = generator.generate_all(&requests, &cancel).await;

    let mut failed = 0;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(preview) => println!("{}\t{}", request.style_identifier(), preview.preview_url),
            Err(e) => {
                failed += 1;
                eprintln!("{}\t{} ({})", request.style_identifier(), e.user_message(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} previews failed", failed, requests.len());
    }

    Ok(())
}
