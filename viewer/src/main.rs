use anyhow::Context;
use clap::Parser;
use shotcore::engine::now_micros;
use shotcore::feed::FeedConnection;
use shotcore::{Engine, EngineConfig, ViewModel};
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::time::{interval, interval_at, Instant};

#[derive(Parser)]
#[command(author, version, about = "Console view over the live gunshot event engine")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    base_url: String,
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws")]
    ws_url: String,
    /// Render tick, seconds
    #[arg(long, default_value_t = 1)]
    tick: u64,
    /// Seconds between log re-fetches
    #[arg(long, default_value_t = 30)]
    log_refresh: u64,
    /// Show one historical instant (seconds since the epoch) instead of
    /// the live stream
    #[arg(long)]
    at: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // One cooperative thread: all engine work happens in response to feed
    // messages, fetch completions, and render ticks.
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating viewer runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let engine = Engine::new(EngineConfig {
        base_url: args.base_url.clone(),
        ws_url: args.ws_url.clone(),
        ..Default::default()
    });

    engine.refresh_sensors().await;
    engine.refresh_logs().await;
    if let Some(ts_secs) = args.at {
        engine.select_timestamp(ts_secs);
    }
    if let Some((lat, lon)) = engine.recenter() {
        println!("map center: ({lat:.5}, {lon:.5})");
    }

    let feed = FeedConnection::spawn(engine.clone());

    let mut render_tick = interval(Duration::from_secs(args.tick.max(1)));
    let refresh_period = Duration::from_secs(args.log_refresh.max(1));
    let mut log_refresh = interval_at(Instant::now() + refresh_period, refresh_period);
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = render_tick.tick() => render(&engine.view(now_micros())),
            _ = log_refresh.tick() => engine.refresh_logs().await,
            _ = &mut ctrl_c => break,
        }
    }

    println!("shutting down");
    feed.shutdown().await;

    let metrics = engine.metrics().snapshot();
    println!(
        "session: {} messages applied, {} malformed, {} reconnects, {} fetch failures",
        metrics.applied, metrics.malformed, metrics.reconnects, metrics.fetch_failures
    );
    Ok(())
}

fn render(view: &ViewModel) {
    let mode = if view.live { "live" } else { "history" };
    println!(
        "[{mode}] sensors: {} | events: {} | log instants: {}",
        view.sensors.len(),
        view.events.len(),
        view.timestamp_options.len()
    );
    if !view.triggered_mic_ids.is_empty() {
        println!("  triggered mics: {:?}", view.triggered_mic_ids);
    }
    for event in &view.events {
        println!(
            "  shot at ({:.5}, {:.5}) r={:.1} m  {}",
            event.lat, event.lon, event.confidence_radius_m, event.time_label
        );
    }
}
