//! # news_link_resolver
//!
//! Ingests Google News RSS categories: every feed link is resolved to the
//! publisher's URL, the article text is extracted from the publisher page
//! (falling back to the feed summary), and the run is written as one JSON
//! batch for the storage layer.
//!
//! ## Usage
//!
//! ```sh
//! news_link_resolver -o ./out
//! news_link_resolver --link 'https://news.google.com/rss/articles/CBMi...?oc=5'
//! ```
//!
//! ## Flow
//!
//! 1. **Feed**: fetch each category's topic feed with a fresh HTTP session
//! 2. **Selection**: keep the newest entries per category
//! 3. **Pipeline**: resolve each link, then extract the article text
//! 4. **Output**: de-duplicate by title and write `{date}/{edition}.json`

use chrono::Local;
use clap::Parser;
use news_link_resolver::config::PipelineConfig;
use news_link_resolver::error::PipelineError;
use news_link_resolver::feed::FeedClient;
use news_link_resolver::http::HttpSession;
use news_link_resolver::ingest::{dedupe_by_title, ingest_category};
use news_link_resolver::models::{IngestBatch, PipelineOutput};
use news_link_resolver::outputs::json;
use news_link_resolver::pipeline::Pipeline;
use news_link_resolver::utils::{ensure_writable_dir, time_of_day};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_link_resolver starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, links = args.link.len(), "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };
    apply_overrides(&mut config, &args);

    // ---- Ad-hoc links ----
    if !args.link.is_empty() {
        let outputs = resolve_links(&config, &args.link).await?;
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    let Some(output_dir) = args.output_dir.as_deref() else {
        return Err("--output-dir is required unless --link is given".into());
    };

    if let Err(e) = ensure_writable_dir(output_dir).await {
        error!(
            path = %output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Ingest categories ----
    let feed = FeedClient::new(&config);
    let pipeline = Pipeline::new(&config);
    let mut articles = Vec::new();

    for category in &config.feed.categories {
        match ingest_category(category, &config, &feed, &pipeline).await {
            Ok(batch) => articles.extend(batch),
            Err(e) => error!(%category, error = %e, "Category failed; continuing with the next one"),
        }
    }

    let articles = dedupe_by_title(articles);
    let extracted = articles.iter().filter(|a| a.extracted).count();

    let now = Local::now();
    let batch = IngestBatch {
        local_date: now.date_naive().to_string(),
        time_of_day: time_of_day(),
        local_time: now.time().format("%H:%M:%S").to_string(),
        articles,
    };
    info!(
        time_of_day = %batch.time_of_day,
        local_date = %batch.local_date,
        articles = batch.articles.len(),
        extracted,
        "Batch assembled"
    );

    let path = json::write_batch(&batch, output_dir).await?;
    info!(path = %path.display(), "Wrote ingestion batch");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Fold command-line overrides into the loaded config.
fn apply_overrides(config: &mut PipelineConfig, args: &Cli) {
    if args.no_courtesy_delay {
        config.courtesy.enabled = false;
    }
    if let Some(per_category) = args.per_category {
        config.feed.per_category = per_category;
    }
    if !args.categories.is_empty() {
        config.feed.categories = args.categories.clone();
    }
}

/// Run every `--link` through the pipeline with one shared session.
#[instrument(level = "info", skip_all, fields(count = links.len()))]
async fn resolve_links(
    config: &PipelineConfig,
    links: &[String],
) -> Result<Vec<PipelineOutput>, PipelineError> {
    for link in links {
        Url::parse(link).map_err(|source| PipelineError::InvalidUrl {
            url: link.clone(),
            source,
        })?;
    }

    let session = HttpSession::new(config)?;
    let pipeline = Pipeline::new(config);
    let mut outputs = Vec::with_capacity(links.len());
    for link in links {
        outputs.push(pipeline.resolve_and_extract(link, &session).await);
    }
    info!(
        extracted = outputs.iter().filter(|o| o.content.is_some()).count(),
        "Processed links"
    );
    Ok(outputs)
}
