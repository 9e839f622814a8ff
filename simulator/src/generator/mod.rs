use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use shotcore::model::Sensor;

use crate::ingest::locate::{meters_between, SPEED_OF_SOUND_MPS};
use crate::ingest::store::MicReport;
use crate::scenario::ScenarioConfig;

const METERS_PER_DEG_LAT: f64 = 111_320.0;
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_000.0;

/// Deterministic sensor deployment scattered around the scenario base
/// point. Mic ids start at 100.
pub fn build_sensor_grid(config: &ScenarioConfig) -> Vec<Sensor> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.sensor_count)
        .map(|index| {
            let (lat, lon) = offset_coordinates(
                &mut rng,
                config.base_lat,
                config.base_lon,
                config.spread_m,
            );
            Sensor::new(100 + index as u32, lat, lon)
        })
        .collect()
}

/// One synthetic shot volley: a shot point near the base, and one report
/// per sensor whose arrival time carries the acoustic delay from it.
pub fn synthesize_volley(
    rng: &mut StdRng,
    config: &ScenarioConfig,
    sensors: &[Sensor],
    shot_time_micros: i64,
) -> Vec<MicReport> {
    let (shot_lat, shot_lon) =
        offset_coordinates(rng, config.base_lat, config.base_lon, config.spread_m);

    sensors
        .iter()
        .map(|sensor| {
            let delay_secs =
                meters_between(sensor.lat, sensor.lon, shot_lat, shot_lon) / SPEED_OF_SOUND_MPS;
            MicReport::new(
                sensor.mic_id,
                sensor.lat,
                sensor.lon,
                shot_time_micros + (delay_secs * 1e6) as i64,
            )
        })
        .collect()
}

/// Random offset within `max_distance_m` of a base position.
fn offset_coordinates(
    rng: &mut StdRng,
    lat: f64,
    lon: f64,
    max_distance_m: f64,
) -> (f64, f64) {
    let angle = rng.gen_range(0.0..2.0 * PI);
    let distance = rng.gen_range(0.0..max_distance_m);

    let delta_lat = distance * angle.cos() / METERS_PER_DEG_LAT;
    let delta_lon =
        distance * angle.sin() / (EARTH_CIRCUMFERENCE_M * lat.to_radians().cos() / 360.0);

    (lat + delta_lat, lon + delta_lon)
}
