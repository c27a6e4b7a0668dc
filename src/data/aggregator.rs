//! Remote summary-statistics service
//!
//! Posts the most recent games of a matchup and reads back per-statistic
//! means. When a preprocess endpoint is configured the request goes through it
//! first and its output is forwarded to the analyse endpoint.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::manifest::Manifest;
use crate::features::schema::{HOME_FIELD, LABEL_FIELD};
use crate::{AggregatorConfig, NbaError, Result};

/// Mean value per statistic name
pub type StatMeans = BTreeMap<String, f32>;

/// Upper bound on attempts per hop, whatever the configuration says
pub const MAX_ATTEMPTS: u32 = 8;

/// Blocking client for the summary service
pub struct AggregatorClient {
    client: reqwest::blocking::Client,
    preprocess_url: Option<String>,
    analyse_url: String,
    max_attempts: u32,
}

impl AggregatorClient {
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("nba-predictor/0.1")
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| NbaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(AggregatorClient {
            client,
            preprocess_url: config.preprocess_url.clone(),
            analyse_url: config.analyse_url.clone(),
            max_attempts: config.max_attempts.clamp(1, MAX_ATTEMPTS),
        })
    }

    /// Summarise the games in `request`
    pub fn summarize(&self, request: &Manifest) -> Result<StatMeans> {
        let mut payload = serde_json::to_value(request)?;

        if let Some(url) = &self.preprocess_url {
            payload = self.post(url, &payload)?;
            log::debug!("Preprocess step returned {} bytes", payload.to_string().len());
        }

        let analysis = self.post(&self.analyse_url, &payload)?;
        parse_summary(&analysis)
    }

    fn post(&self, url: &str, body: &Value) -> Result<Value> {
        with_retry(
            || {
                let response = self.client.post(url).json(body).send()?;
                let status = response.status();
                if !status.is_success() {
                    return Err(NbaError::Dependency(format!(
                        "aggregator {} returned {}",
                        url, status
                    )));
                }
                response.json::<Value>().map_err(|e| {
                    NbaError::Dependency(format!("aggregator {} sent malformed JSON: {}", url, e))
                })
            },
            self.max_attempts,
        )
    }
}

/// Retry an operation with exponential backoff, but only for transport failures
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if is_transient(&e) && attempt + 1 < max_attempts => {
                log::warn!("Attempt {} failed: {}", attempt + 1, e);
                std::thread::sleep(backoff_delay(attempt));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 100ms doubled per attempt, saturating instead of overflowing
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(100u64.saturating_mul(2u64.saturating_pow(attempt)))
}

fn is_transient(error: &NbaError) -> bool {
    match error {
        NbaError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Collect every `{"mean": x}` leaf of a nested summary, keyed by its parent name
pub fn parse_summary(value: &Value) -> Result<StatMeans> {
    let mut means = StatMeans::new();
    collect_means(value, &mut means);

    if means.is_empty() {
        return Err(NbaError::Dependency(
            "aggregator response contained no statistic means".to_string(),
        ));
    }
    if let Some((name, _)) = means.iter().find(|(_, mean)| !mean.is_finite()) {
        return Err(NbaError::Dependency(format!(
            "aggregator returned a non-finite mean for {}",
            name
        )));
    }
    Ok(means)
}

fn collect_means(value: &Value, out: &mut StatMeans) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let mean = child.get("mean").and_then(Value::as_f64);
                match mean {
                    Some(m) if name != HOME_FIELD && name != LABEL_FIELD => {
                        out.insert(name.clone(), m as f32);
                    }
                    Some(_) => {}
                    None => collect_means(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_means(item, out)),
        _ => {}
    }
}
