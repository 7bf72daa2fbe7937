use crate::config::ApiConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// One bounded request against the reporting API. Implementations never
/// surface transport problems to callers: any failure collapses to `None`.
pub trait ReportSource: Send + Sync {
    fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Option<Value>;
}

/// Live client for the dashboard reporting API.
///
/// A payload that arrives with an `error` or `detail` key is an API-declared
/// failure and is treated the same as a transport error.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }
}

impl ReportSource for HttpSource {
    fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Option<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, ?params, "fetching report data");

        let client = match reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!(%url, error = %err, "could not build http client");
                return None;
            }
        };

        let response = match client.get(&url).query(params).send() {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, error = %err, "request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success response");
            return None;
        }

        let payload: Value = match response.json() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%url, error = %err, "response body was not valid json");
                return None;
            }
        };

        for declared_error_key in ["error", "detail"] {
            if let Some(detail) = payload.get(declared_error_key).filter(|v| !v.is_null()) {
                warn!(%url, %detail, "api declared an error");
                return None;
            }
        }

        Some(payload)
    }
}

/// In-memory source holding canned endpoint responses, keyed by endpoint and
/// query parameters. Used by tests and offline demos.
#[derive(Debug, Default)]
pub struct StaticSource {
    responses: HashMap<String, Value>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, endpoint: &str, params: &[(&str, &str)], payload: Value) {
        self.responses.insert(
            canonical_key(endpoint, params.iter().map(|(k, v)| (*k, *v))),
            payload,
        );
    }
}

impl ReportSource for StaticSource {
    fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Option<Value> {
        let key = canonical_key(endpoint, params.iter().map(|(k, v)| (*k, v.as_str())));
        let hit = self.responses.get(&key).cloned();
        if hit.is_none() {
            debug!(%key, "no canned response");
        }
        hit
    }
}

fn canonical_key<'a>(endpoint: &str, params: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut pairs: Vec<(&str, &str)> = params.collect();
    pairs.sort();
    let query: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{}?{}", endpoint, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn static_source_matches_regardless_of_param_order() {
        let mut source = StaticSource::new();
        source.insert(
            "/report_jsm/farm-ponds-marks",
            &[("district", "BHOPAL"), ("date", "2024-05-01")],
            json!({"results": []}),
        );

        let params = [
            ("date", "2024-05-01".to_string()),
            ("district", "BHOPAL".to_string()),
        ];
        let payload = source
            .fetch("/report_jsm/farm-ponds-marks", &params)
            .expect("canned payload found");
        assert_eq!(payload, json!({"results": []}));
    }

    #[test]
    fn static_source_misses_return_none() {
        let source = StaticSource::new();
        assert!(source.fetch("/report_jsm/blocks", &[]).is_none());
    }
}
