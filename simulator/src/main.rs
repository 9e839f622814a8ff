use anyhow::Context;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::time::{interval, Duration};

mod generator;
mod ingest;
mod scenario;
mod server;

use ingest::detect::{Detector, SharedStore};
use ingest::store::SimStore;
use scenario::ScenarioConfig;
use server::ws::Broadcaster;

#[derive(Parser)]
#[command(author, version, about = "Backend stand-in for the acoustic gunshot platform")]
struct Args {
    /// Load a scenario config from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 8000)]
    port: u16,
    #[arg(long, default_value_t = 4)]
    sensors: usize,
    /// Seconds between synthetic shot volleys (0 disables the generator)
    #[arg(long, default_value_t = 15)]
    shot_interval: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::from_args(args.sensors, args.shot_interval, args.seed)
    };

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating simulator runtime")?;
    runtime.block_on(run(args.port, config))
}

async fn run(port: u16, config: ScenarioConfig) -> anyhow::Result<()> {
    let sensors = generator::build_sensor_grid(&config);
    info!(
        "deployed {} sensors around ({:.4}, {:.4})",
        sensors.len(),
        config.base_lat,
        config.base_lon
    );

    let store: SharedStore = Arc::new(RwLock::new(SimStore::with_sensors(sensors)));
    let broadcaster = Broadcaster::new();
    let detector = Detector::spawn(store.clone(), broadcaster.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let api = server::routes(
        store.clone(),
        broadcaster.clone(),
        detector.clone(),
        config.clone(),
    );
    tokio::spawn(warp::serve(api).run(addr));
    info!("listening on http://{addr} (stream at ws://{addr}/ws)");

    if config.shot_interval_secs > 0 {
        tokio::spawn(run_generator(config, store, broadcaster, detector));
    }

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    info!("shutting down");
    Ok(())
}

/// Emit a synthetic shot volley on the configured cadence, through the
/// same ingestion path as `POST /log_event`.
async fn run_generator(
    config: ScenarioConfig,
    store: SharedStore,
    broadcaster: Broadcaster,
    detector: Detector,
) {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut ticker = interval(Duration::from_secs(config.shot_interval_secs));

    loop {
        ticker.tick().await;
        let sensors = store.read().map(|guard| guard.sensors()).unwrap_or_default();
        if sensors.is_empty() {
            continue;
        }
        let reports = generator::synthesize_volley(
            &mut rng,
            &config,
            &sensors,
            shotcore::engine::now_micros(),
        );
        let recorded = server::ingest_batch(reports, &store, &broadcaster, &detector);
        info!("generator volley: {recorded} reports recorded");
    }
}
