//! Batch CLI for the reagent offer pipeline.
//!
//! Loads credentials from the environment, runs one campaign, renders the
//! flattened offer rows as a table, and optionally exports them as CSV.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use acquisition::providers::{GeminiModel, SerpSearcher};
use acquisition::security::Credentials;
use acquisition::strategies::{BrowserGatewayStrategy, DirectStrategy, ProxyStrategy};
use acquisition::{
    Campaign, CampaignConfig, ContentFetcher, FetchStatus, FetchStrategy, OfferRow, PipelineEvent,
    Query,
};

const GATEWAY_ENDPOINT: &str = "https://api.browsergateway.io/render";

#[derive(Parser)]
#[command(name = "scout", about = "Find reagent offers across e-commerce sites")]
struct Args {
    /// Reagent name to search for (e.g. "Y-27632", "DMSO")
    query: String,

    /// Narrow the search to one manufacturer
    #[arg(long)]
    manufacturer: Option<String>,

    /// Concurrent site workers
    #[arg(long, default_value_t = 4)]
    pool: usize,

    /// Allow multiple records per site
    #[arg(long)]
    exhaustive: bool,

    /// Export the rows as CSV; default file name is timestamped
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    csv: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acquisition=warn".into()),
        )
        .init();

    let args = Args::parse();

    // The only campaign-fatal condition: checked before anything starts.
    let creds = Credentials::from_env().context("provider credentials missing")?;

    let config = CampaignConfig::default()
        .with_pool_size(args.pool)
        .with_exhaustive(args.exhaustive);

    let mut strategies: Vec<Arc<dyn FetchStrategy>> = Vec::new();
    if let Some(key) = &creds.gateway_api_key {
        strategies.push(Arc::new(BrowserGatewayStrategy::new(
            GATEWAY_ENDPOINT,
            key.clone(),
        )?));
    }
    if let Some(proxy_url) = &creds.proxy_url {
        strategies.push(Arc::new(ProxyStrategy::new(proxy_url)?));
    }
    strategies.push(Arc::new(DirectStrategy::new()?));

    let fetcher = ContentFetcher::new(strategies, config.url_budget);
    let searcher = SerpSearcher::new(creds.search_api_key.clone())
        .with_country(config.search_country.clone())
        .with_language(config.search_language.clone());
    let model = GeminiModel::new(creds.model_api_key.clone());

    let (events, mut progress) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = progress.recv().await {
            render_event(&event);
        }
    });

    let campaign = Campaign::new(searcher, fetcher, model, config).with_events(events);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("stopping...");
            interrupt.cancel();
        }
    });

    let mut query = Query::new(&args.query);
    if let Some(manufacturer) = &args.manufacturer {
        query = query.with_manufacturer(manufacturer);
    }

    let mut result = campaign.run(&query, &cancel).await?;
    drop(campaign);
    printer.await.ok();

    result.sort_by_site();
    let rows = result.rows();

    if rows.is_empty() {
        println!("No offers found for \"{}\".", args.query);
    } else {
        print_table(&rows);
    }
    println!(
        "{} offers / {} of {} sites succeeded / {} records filtered",
        rows.len(),
        result.sites_succeeded,
        result.sites_attempted,
        result.records_filtered
    );

    if let Some(csv) = args.csv {
        let path = csv.unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}_export.csv",
                chrono::Local::now().format("%Y-%m-%dT%H-%M")
            ))
        });
        write_csv(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
        println!("CSV written to {}", path.display());
    }

    Ok(())
}

fn render_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::CampaignStarted { target_name, sites, .. } => {
            println!("Searching {sites} sites for \"{target_name}\"...");
        }
        PipelineEvent::SiteStarted { site, .. } => {
            println!("[{site}] started");
        }
        PipelineEvent::SearchCompleted { site, variant, candidates, latency_ms, .. } => {
            println!("[{site}] search variant {variant}: {candidates} candidates ({latency_ms}ms)");
        }
        PipelineEvent::FetchAttempted { site, strategy, status, latency_ms, .. } => {
            println!(
                "[{site}] fetch via {strategy}: {} ({latency_ms}ms)",
                status_label(*status)
            );
        }
        PipelineEvent::ExtractionCompleted { site, offers, latency_ms, .. } => {
            println!("[{site}] extracted {offers} offers ({latency_ms}ms)");
        }
        PipelineEvent::RecordFiltered { site, product_name, similarity, .. } => {
            println!("[{site}] filtered \"{product_name}\" (similarity {similarity:.2})");
        }
        PipelineEvent::SiteCompleted { site, records, latency_ms, .. } => {
            println!("[{site}] done: {records} records ({latency_ms}ms)");
        }
        PipelineEvent::CampaignCompleted {
            sites_succeeded,
            sites_attempted,
            duration_ms,
            ..
        } => {
            println!(
                "Done: {sites_succeeded}/{sites_attempted} sites in {:.1}s",
                *duration_ms as f64 / 1000.0
            );
        }
    }
}

fn status_label(status: FetchStatus) -> &'static str {
    match status {
        FetchStatus::Ok => "ok",
        FetchStatus::Failed => "failed",
        FetchStatus::Undersized => "undersized",
        FetchStatus::Blocked => "blocked",
        FetchStatus::Timeout => "timeout",
    }
}

const HEADERS: [&str; 8] = [
    "Product", "Site", "Model", "Manufacturer", "Size", "Price", "Stock", "URL",
];

fn row_cells(row: &OfferRow) -> [String; 8] {
    [
        row.product_name.clone(),
        row.site.clone(),
        row.model_number.clone(),
        row.manufacturer.clone(),
        row.size.clone(),
        format!("{}", row.price),
        if row.in_stock { "yes" } else { "no" }.to_string(),
        row.source_url.clone(),
    ]
}

fn print_table(rows: &[OfferRow]) {
    let cells: Vec<[String; 8]> = rows.iter().map(row_cells).collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect();
        println!("{}", padded.join("  "));
    };

    line(&HEADERS.map(String::from));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in &cells {
        line(row);
    }
}

/// Write rows as CSV with a UTF-8 BOM, so spreadsheet apps open the
/// Japanese product names correctly.
fn write_csv(path: &PathBuf, rows: &[OfferRow]) -> Result<()> {
    let mut out = std::fs::File::create(path)?;
    out.write_all("\u{FEFF}".as_bytes())?;
    writeln!(out, "{}", HEADERS.map(csv_field).join(","))?;
    for row in rows {
        writeln!(out, "{}", row_cells(row).map(|c| csv_field(&c)).join(","))?;
    }
    Ok(())
}

fn csv_field(value: impl AsRef<str>) -> String {
    let value = value.as_ref();
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
