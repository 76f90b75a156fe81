use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use collection_planner::config::AppConfig;
use collection_planner::dashboard::Dashboard;
use collection_planner::haversine::HaversineEstimator;
use collection_planner::model::Coordinate;
use collection_planner::osrm::OsrmClient;
use collection_planner::pipeline::route_color;
use collection_planner::polyline;
use collection_planner::route::RouteFetcher;
use tokio::task::LocalSet;
use tracing::info;

mod parsers;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize routes for the stored vehicles and points, then print the map as GeoJSON
    Optimize {
        /// Write the GeoJSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch the road route through the given stops, in order
    Route {
        /// Stops as `lat,lng`
        #[arg(required = true, num_args = 2.., value_parser = parsers::parse_coordinate)]
        stops: Vec<Coordinate>,
    },
    /// Decode an encoded polyline into `lat,lng` lines
    Decode {
        polyline: String,

        #[arg(
            short,
            long,
            default_value_t = polyline::DEFAULT_PRECISION,
            value_parser = clap::value_parser!(u32).range(0..=polyline::MAX_PRECISION as i64)
        )]
        precision: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Optimize { output } => {
            LocalSet::new()
                .run_until(optimize(&config, output))
                .await?
        }
        Commands::Route { stops } => {
            let fetcher = RouteFetcher::new(OsrmClient::new(config.osrm.clone())?)
                .with_estimator(HaversineEstimator::new(config.osrm.fallback_speed_kmh));
            let route = fetcher.fetch(&stops, route_color(0)).await;
            if route.is_fallback() {
                info!("routing engine unavailable, showing straight line");
            }
            println!("{}", route.summary);
            println!(
                "{}",
                polyline::encode(route.path.points(), polyline::DEFAULT_PRECISION)?
            );
        }
        Commands::Decode {
            polyline: encoded,
            precision,
        } => {
            let decoded = polyline::decode(&encoded, precision)?;
            for point in decoded.points() {
                println!("{},{}", point.lat, point.lng);
            }
        }
    }

    Ok(())
}

async fn optimize(config: &AppConfig, output: Option<PathBuf>) -> Result<(), anyhow::Error> {
    let dashboard = Dashboard::connect(config)?;
    dashboard.load_points().await?;

    let result = dashboard.optimize().await?;
    let report = dashboard.show(&result).finish().await;
    info!(
        routes = report.outcomes.len(),
        stops = report.stops,
        skipped = report.skipped.len(),
        "routes drawn"
    );

    let vehicles = dashboard.backend().vehicles().await?;
    for row in dashboard.statistics(&result, &vehicles) {
        eprintln!(
            "vehicle {} ({}): {} stops, {} km, {} min",
            row.vehicle_id, row.plate, row.stops, row.distance_km, row.duration_min
        );
    }
    if !result.unassigned.is_empty() {
        eprintln!("unassigned waste points: {:?}", result.unassigned);
    }

    let geojson = serde_json::to_string_pretty(&dashboard.surface().snapshot())?;
    match output {
        Some(path) => std::fs::write(&path, geojson)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", geojson),
    }
    Ok(())
}
