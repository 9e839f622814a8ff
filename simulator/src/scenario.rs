use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scenario driving the backend stand-in: the sensor deployment and the
/// synthetic shot cadence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub sensor_count: usize,
    pub base_lat: f64,
    pub base_lon: f64,
    /// Sensor scatter radius around the base point, meters.
    pub spread_m: f64,
    /// Seconds between synthetic shot volleys; 0 disables the generator.
    pub shot_interval_secs: u64,
    pub seed: u64,
    pub api_key: String,
    pub description: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sensor_count: 4,
            base_lat: 42.2808,
            base_lon: -83.7430,
            spread_m: 60.0,
            shot_interval_secs: 15,
            seed: 0,
            api_key: "dev-key".into(),
            description: None,
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario config {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sensor_count: usize, shot_interval_secs: u64, seed: u64) -> Self {
        Self {
            sensor_count,
            shot_interval_secs,
            seed,
            ..Default::default()
        }
    }
}
