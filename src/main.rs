mod catalog;
mod cluster;
mod export;
mod filter;
mod map;
mod stats;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use catalog::Catalog;
use cluster::{ClusterModel, TrainConfig};
use filter::FilterCriteria;
use map::Palette;

#[derive(Parser, Debug)]
#[command(name = "wisatamap")]
#[command(about = "Cluster Bali tourist destinations and serve filtered map views")]
#[command(version)]
struct Args {
    /// Catalog CSV path
    #[arg(long, default_value = "data/destinations.csv")]
    catalog: PathBuf,

    /// Cluster model JSON path; trained and saved here when absent
    #[arg(long, default_value = "model_kmeans.json")]
    model: PathBuf,

    /// Number of clusters when training a fresh model
    #[arg(short, long, default_value_t = 3)]
    k: usize,

    /// RNG seed for reproducible training
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Only destinations in this kabupaten/kota
    #[arg(long)]
    region: Option<String>,

    /// Only destinations of this category
    #[arg(long)]
    category: Option<String>,

    /// Write the filtered records as CSV to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write markers and legend as JSON to this path
    #[arg(long)]
    markers: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let records = catalog::load_csv(&args.catalog)?;
    log::info!(
        "Loaded {} destinations from {}",
        records.len(),
        args.catalog.display()
    );

    // Training is an offline step; the serving path reuses a persisted
    // model so cluster labels and colors stay stable between runs.
    let model = if args.model.exists() {
        let model = ClusterModel::load(&args.model)?;
        log::info!(
            "Loaded cluster model (k = {}) from {}",
            model.k,
            args.model.display()
        );
        model
    } else {
        let config = TrainConfig {
            k: args.k,
            seed: args.seed,
            ..TrainConfig::default()
        };
        let model = cluster::train(&records, &config)?;
        model.save(&args.model)?;
        log::info!(
            "Trained cluster model (k = {}, seed = {}) and saved to {}",
            model.k,
            args.seed,
            args.model.display()
        );
        model
    };

    let catalog = Catalog::new(cluster::assign(records, &model)?);

    let summary = stats::CatalogSummary::of(&catalog);
    log::info!(
        "Catalog: {} destinations across {} regions and {} categories",
        summary.destinations,
        summary.regions,
        summary.categories
    );

    let criteria = FilterCriteria {
        region: args.region,
        category: args.category,
    };
    let view = filter::apply(&catalog, &criteria);

    if view.is_empty() {
        log::warn!("No destinations match the selected filters");
    } else {
        log::info!("Matching destinations: {}", view.count());
        if let Some(avg) = view.avg_rating() {
            log::info!("Average rating: {avg:.1}");
        }
        if let Some(top) = view.top_category() {
            log::info!("Top category: {top}");
        }
        log::info!("Active clusters: {}", view.active_cluster_count());
        for (category, n) in stats::category_distribution(&view) {
            log::info!("  {category}: {n}");
        }
        for bin in stats::rating_histogram(&view, stats::DEFAULT_HISTOGRAM_BINS) {
            if bin.count > 0 {
                log::debug!("rating [{:.2}, {:.2}): {}", bin.lower, bin.upper, bin.count);
            }
        }
    }

    let map_view = map::project(&view, &Palette::default())?;
    log::info!(
        "Projected {} markers, {} legend entries (center {:?}, zoom {})",
        map_view.markers.len(),
        map_view.legend.len(),
        map::MAP_CENTER,
        map::MAP_ZOOM
    );

    if let Some(path) = &args.export {
        export::export_csv(&view, path)?;
        log::info!("Exported filtered records to {}", path.display());
    }
    if let Some(path) = &args.markers {
        fs::write(path, serde_json::to_string_pretty(&map_view)?)?;
        log::info!("Wrote map markers to {}", path.display());
    }

    Ok(())
}
