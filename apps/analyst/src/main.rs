use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    AnalysisClient, AnalysisService, ClientOptions, IgnoreReason, RequestController,
    SubmitOutcome,
};
use markup::CommonMarkDelegate;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::load_settings;
use surface::HtmlPageSurface;

const PAGE_TITLE: &str = "Topic Analyst";

#[derive(Parser, Debug)]
#[command(about = "Submit topics to the analysis service and render the results page")]
struct Args {
    #[arg(long, default_value = "analyst.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Probe the service health endpoint before submitting anything.
    #[arg(long)]
    check_health: bool,
    /// Topics to analyze in order; read from stdin, one per line, when omitted.
    topics: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.output {
        settings.output_path = v;
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = Some(v);
    }

    let client = AnalysisClient::with_options(ClientOptions {
        base_url: settings.server_url.clone(),
        request_timeout: settings.request_timeout(),
    })
    .context("failed to configure analysis client")?;
    info!(url = %client.analyze_url(), output = %settings.output_path.display(), "analyst ready");

    if args.check_health {
        match client.health().await {
            Ok(status) if status.is_ok() => info!("analysis service is healthy"),
            Ok(status) => warn!(status = %status.status, "analysis service reports degraded health"),
            Err(err) => warn!(error = %err, "analysis service health check failed"),
        }
    }

    let surface = Arc::new(HtmlPageSurface::new(PAGE_TITLE));
    let controller = RequestController::new(
        Arc::new(client),
        surface.clone(),
        Arc::new(CommonMarkDelegate::default()),
    );

    if args.topics.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("failed to read topic")? {
            run_topic(&controller, &surface, &settings.output_path, &line).await?;
        }
    } else {
        for topic in &args.topics {
            run_topic(&controller, &surface, &settings.output_path, topic).await?;
        }
    }

    Ok(())
}

async fn run_topic(
    controller: &RequestController,
    surface: &HtmlPageSurface,
    output_path: &Path,
    topic: &str,
) -> Result<()> {
    let outcome = controller.submit(topic).await;
    if let SubmitOutcome::Ignored(reason) = outcome {
        if reason == IgnoreReason::Busy {
            warn!(topic, "previous analysis still running; topic dropped");
        }
        return Ok(());
    }

    surface.set_topic_value(topic.trim());
    surface.write_to(output_path).await?;
    match outcome {
        SubmitOutcome::Succeeded { facts } => println!(
            "{topic}: {facts} key facts, page written to {}",
            output_path.display()
        ),
        SubmitOutcome::Failed(_) => eprintln!("{topic}: {}", surface.document().status),
        SubmitOutcome::Ignored(_) => {}
    }
    Ok(())
}
