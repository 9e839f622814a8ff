pub mod ws;

use std::convert::Infallible;

use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Reply};

use crate::generator;
use crate::ingest::detect::{Detector, SharedStore};
use crate::ingest::store::{IngestOutcome, MicReport};
use crate::scenario::ScenarioConfig;
use ws::Broadcaster;

fn with<T: Clone + Send>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

/// All routes of the backend stand-in: the two fetch endpoints and the
/// stream consumed by the engine, plus the ingestion surface.
pub fn routes(
    store: SharedStore,
    broadcaster: Broadcaster,
    detector: Detector,
    config: ScenarioConfig,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let get_sensors = warp::path("get_sensors")
        .and(warp::get())
        .and(with(store.clone()))
        .map(|store: SharedStore| warp::reply::json(&store.read().unwrap().sensors()));

    let get_all_logs = warp::path("get_all_logs")
        .and(warp::get())
        .and(with(store.clone()))
        .map(|store: SharedStore| warp::reply::json(&store.read().unwrap().log_entries()));

    let gunshot_events = warp::path("gunshot_events")
        .and(warp::get())
        .and(with(store.clone()))
        .map(|store: SharedStore| warp::reply::json(&store.read().unwrap().events_desc()));

    let log_event = warp::path("log_event")
        .and(warp::post())
        .and(warp::header::optional::<String>("x-api-key"))
        .and(warp::body::json())
        .and(with(store.clone()))
        .and(with(broadcaster.clone()))
        .and(with(detector.clone()))
        .and(with(config.api_key.clone()))
        .map(handle_log_event);

    let generate_test_logs = warp::path("generate_test_logs")
        .and(warp::post())
        .and(with(store.clone()))
        .and(with(broadcaster.clone()))
        .and(with(detector.clone()))
        .and(with(config))
        .map(handle_generate_test_logs);

    let delete_all = warp::path("delete_all")
        .and(warp::post())
        .and(with(store))
        .map(|store: SharedStore| {
            store.write().unwrap().clear_all();
            warp::reply::json(&json!({ "message": "all data cleared" }))
        });

    let stream = warp::path("ws")
        .and(warp::ws())
        .and(with(broadcaster))
        .map(|upgrade: warp::ws::Ws, broadcaster: Broadcaster| {
            upgrade.on_upgrade(move |socket| ws::client_connected(socket, broadcaster))
        });

    get_sensors
        .or(get_all_logs)
        .or(gunshot_events)
        .or(log_event)
        .or(generate_test_logs)
        .or(delete_all)
        .or(stream)
}

fn handle_log_event(
    key: Option<String>,
    report: MicReport,
    store: SharedStore,
    broadcaster: Broadcaster,
    detector: Detector,
    api_key: String,
) -> WithStatus<Json> {
    if key.as_deref() != Some(api_key.as_str()) {
        return reply_status(
            json!({ "error": "invalid api key" }),
            StatusCode::UNAUTHORIZED,
        );
    }

    let now_secs = shotcore::engine::now_micros() as f64 / 1e6;
    let outcome = store.write().unwrap().ingest(report, now_secs);
    match outcome {
        IngestOutcome::Invalid(reason) => {
            warn!("rejected log event: {reason}");
            reply_status(json!({ "error": reason }), StatusCode::BAD_REQUEST)
        }
        IngestOutcome::Duplicate => reply_status(
            json!({ "message": "Duplicate log detected" }),
            StatusCode::OK,
        ),
        IngestOutcome::Recorded { sensor_moved } => {
            detector.notify(report.timestamp);
            if sensor_moved {
                broadcaster.send_sensor_update(&store.read().unwrap().sensors());
            }
            reply_status(json!({ "message": "Log event recorded" }), StatusCode::OK)
        }
    }
}

fn handle_generate_test_logs(
    store: SharedStore,
    broadcaster: Broadcaster,
    detector: Detector,
    config: ScenarioConfig,
) -> WithStatus<Json> {
    let sensors = store.read().unwrap().sensors();
    if sensors.is_empty() {
        return reply_status(
            json!({ "error": "no sensors deployed" }),
            StatusCode::BAD_REQUEST,
        );
    }

    let mut rng = StdRng::from_entropy();
    let shot_time = shotcore::engine::now_micros();
    let reports = generator::synthesize_volley(&mut rng, &config, &sensors, shot_time);
    let mic_ids: Vec<u32> = reports.iter().map(|report| report.mic_id).collect();
    let recorded = ingest_batch(reports, &store, &broadcaster, &detector);

    reply_status(
        json!({
            "message": format!("{recorded} synthetic logs inserted"),
            "timestamp": shot_time,
            "mic_ids": mic_ids,
        }),
        StatusCode::CREATED,
    )
}

/// Feed a batch of reports through the same ingestion path as
/// `POST /log_event`: record, notify the detector, and broadcast one
/// sensor update if any mic moved.
pub fn ingest_batch(
    reports: Vec<MicReport>,
    store: &SharedStore,
    broadcaster: &Broadcaster,
    detector: &Detector,
) -> usize {
    let now_secs = shotcore::engine::now_micros() as f64 / 1e6;
    let mut recorded = 0;
    let mut any_moved = false;

    for report in reports {
        let outcome = store.write().unwrap().ingest(report, now_secs);
        match outcome {
            IngestOutcome::Recorded { sensor_moved } => {
                recorded += 1;
                any_moved |= sensor_moved;
                detector.notify(report.timestamp);
            }
            IngestOutcome::Duplicate => {}
            IngestOutcome::Invalid(reason) => warn!("generator produced a bad report: {reason}"),
        }
    }

    if any_moved {
        broadcaster.send_sensor_update(&store.read().unwrap().sensors());
    }
    recorded
}

fn reply_status(value: serde_json::Value, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&value), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::store::SimStore;
    use shotcore::model::Sensor;
    use std::sync::{Arc, RwLock};

    fn test_setup() -> (SharedStore, Broadcaster, Detector, ScenarioConfig) {
        let store: SharedStore = Arc::new(RwLock::new(SimStore::with_sensors(vec![
            Sensor::new(100, 42.2800, -83.7430),
            Sensor::new(101, 42.2810, -83.7428),
        ])));
        let broadcaster = Broadcaster::new();
        let detector = Detector::spawn(store.clone(), broadcaster.clone());
        (store, broadcaster, detector, ScenarioConfig::default())
    }

    #[tokio::test]
    async fn get_sensors_serves_the_deployment() {
        let (store, broadcaster, detector, config) = test_setup();
        let api = routes(store, broadcaster, detector, config);

        let response = warp::test::request()
            .method("GET")
            .path("/get_sensors")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let sensors: Vec<Sensor> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(sensors.len(), 2);
    }

    #[tokio::test]
    async fn log_event_requires_the_api_key() {
        let (store, broadcaster, detector, config) = test_setup();
        let api = routes(store, broadcaster, detector, config);
        let report = MicReport::new(100, 42.28, -83.74, shotcore::engine::now_micros());

        let denied = warp::test::request()
            .method("POST")
            .path("/log_event")
            .json(&report)
            .reply(&api)
            .await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let accepted = warp::test::request()
            .method("POST")
            .path("/log_event")
            .header("x-api-key", "dev-key")
            .json(&report)
            .reply(&api)
            .await;
        assert_eq!(accepted.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ingested_logs_show_up_in_get_all_logs() {
        let (store, broadcaster, detector, config) = test_setup();
        let api = routes(store.clone(), broadcaster, detector, config);
        let now = shotcore::engine::now_micros();

        let report = MicReport::new(100, 42.28, -83.74, now);
        warp::test::request()
            .method("POST")
            .path("/log_event")
            .header("x-api-key", "dev-key")
            .json(&report)
            .reply(&api)
            .await;

        let response = warp::test::request()
            .method("GET")
            .path("/get_all_logs")
            .reply(&api)
            .await;
        let entries: Vec<shotcore::model::LogEntry> =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, now / 1_000_000);
    }

    #[tokio::test]
    async fn delete_all_clears_the_store() {
        let (store, broadcaster, detector, config) = test_setup();
        let api = routes(store.clone(), broadcaster, detector, config);

        warp::test::request()
            .method("POST")
            .path("/delete_all")
            .reply(&api)
            .await;
        assert!(store.read().unwrap().sensors().is_empty());
    }
}
