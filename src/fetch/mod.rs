//! Blocking HTTP access to the USGS API.
//!
//! Everything that talks to the network goes through [`FeatureSource`], so the
//! batching and caching logic can be driven by an in-memory source in tests.

pub mod error;

use error::FetchError;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use std::time::Duration;

/// Query parameters in the order they are sent. Keys may repeat.
pub type QueryParams = Vec<(String, String)>;

/// Something that can answer a GET with a JSON document.
pub trait FeatureSource {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value, FetchError>;
}

/// [`FeatureSource`] backed by a blocking `reqwest` client.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("usgs_water/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self { client })
    }
}

impl FeatureSource for HttpSource {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value, FetchError> {
        debug!("GET {} with {} query parameters", url, params.len());

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let body = response
            .text()
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::JsonParse {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Expands a JSON query template into request parameters.
///
/// Strings are sent as-is, numbers and booleans as their JSON text, arrays
/// repeat the key once per element, and nulls are left out.
pub fn query_params(template: &Map<String, Value>) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in template {
        match value {
            Value::Array(items) => {
                params.extend(items.iter().filter_map(|item| {
                    scalar_text(item).map(|text| (key.clone(), text))
                }));
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    params.push((key.clone(), text));
                }
            }
        }
    }
    params
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
