use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::model::{LogEntry, Sensor};
use crate::prelude::{EngineConfig, EngineError, EngineResult};

/// HTTP client for the sensor and log stores. Non-2xx responses are
/// failures; a request timeout is applied defensively.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &EngineConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_sensors(&self) -> EngineResult<Vec<Sensor>> {
        self.get_json("/get_sensors").await
    }

    pub async fn get_all_logs(&self) -> EngineResult<Vec<LogEntry>> {
        self.get_json("/get_all_logs").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| EngineError::Fetch(format!("{url}: {err}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Fetch(format!(
                "{url}: status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| EngineError::Fetch(format!("{url}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new(&EngineConfig {
            base_url: "http://127.0.0.1:8000/".into(),
            ..Default::default()
        });
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
    }
}
