use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use explorer::config::ExplorerConfig;
use explorer::session::Explorer;
use foundation::viewport::ViewportState;
use layers::symbology::Tier;
use serde_json::json;
use streaming::http::HttpRegionSearch;
use streaming::search::{RegionSearch, StaticPlaces};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay settled viewports through the place loader")]
struct Args {
    /// JSON array of viewports: [{"bounds": {...}, "zoom": 12}, ...]
    viewports: PathBuf,

    /// Place catalog to search (array of places or {"locations": [...]})
    #[arg(long, required_unless_present = "url", conflicts_with = "url")]
    places: Option<PathBuf>,

    /// Base URL of a places server to search instead of a local catalog
    #[arg(long)]
    url: Option<String>,

    /// Explorer config JSON (bufferFraction, fetchThreshold, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every annotated place after each step, not just a summary
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    let json = tokio::fs::read_to_string(&args.viewports).await?;
    let viewports: Vec<ViewportState> = serde_json::from_str(&json)?;
    info!("replaying {} viewports", viewports.len());

    match (&args.places, &args.url) {
        (Some(path), _) => {
            let catalog = StaticPlaces::from_json(&tokio::fs::read_to_string(path).await?)?;
            info!("searching {} catalog places", catalog.len());
            replay(Explorer::new(config, catalog)?, viewports, args.full).await
        }
        (None, Some(url)) => {
            let search = HttpRegionSearch::new(url);
            info!("searching {}", search.url());
            replay(Explorer::new(config, search)?, viewports, args.full).await
        }
        (None, None) => Err("either --places or --url is required".into()),
    }
}

async fn replay<S: RegionSearch + 'static>(
    mut explorer: Explorer<S>,
    viewports: Vec<ViewportState>,
    full: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for (step, viewport) in viewports.into_iter().enumerate() {
        let feed = explorer.handle_viewport(viewport).await;
        let events: Vec<_> = explorer
            .drain_events()
            .into_iter()
            .map(|e| json!({"sequence": e.sequence, "event": e.kind.name()}))
            .collect();

        let mut tiers: BTreeMap<Tier, usize> = BTreeMap::new();
        for place in feed.revealed() {
            if let Some(tier) = place.tier {
                *tiers.entry(tier).or_default() += 1;
            }
        }
        let tiers: BTreeMap<String, usize> =
            tiers.into_iter().map(|(t, n)| (t.to_string(), n)).collect();

        let mut line = json!({
            "step": step,
            "sequence": feed.sequence,
            "zoom": feed.zoom,
            "cached": feed.len(),
            "revealed": feed.revealed().count(),
            "tiers": tiers,
            "events": events,
        });
        if full {
            line["feed"] = serde_json::to_value(&*feed)?;
        }
        println!("{line}");
    }

    let metrics = explorer.metrics().snapshot();
    let counters: BTreeMap<_, _> = metrics.counters.into_iter().collect();
    println!("{}", json!({ "metrics": counters }));
    Ok(())
}
