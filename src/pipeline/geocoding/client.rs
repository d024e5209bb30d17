use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{GeocodeRequest, GeocodeResponse, Geometry, LatLng, Viewport};
use super::GeocodeError;
use crate::config::{GeocoderConfig, DEFAULT_GEOCODER_URL};

/// Provider status values that are not errors.
const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// A forward geocoding backend.
///
/// `Ok(vec![])` means the provider answered and found nothing. Transport and
/// provider failures are `Err`. Results are in the provider's ranking order.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Vec<GeocodeResponse>, GeocodeError>;
}

// ═══════════════════════════════════════════════════════════
// HTTP provider
// ═══════════════════════════════════════════════════════════

/// Client for a Google-compatible `geocode/json` endpoint.
pub struct HttpGeocoder {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpGeocoder {
    /// The default public endpoint requires an API key; custom endpoints do not.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        if config.api_key.is_none() && config.base_url == DEFAULT_GEOCODER_URL {
            return Err(GeocodeError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn from_env() -> Result<Self, GeocodeError> {
        Self::new(&GeocoderConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(&self, request: &GeocodeRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![("address", request.address.clone())];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        if let Some(location) = request.location {
            params.push(("location", location.as_query()));
            if let Some(radius) = request.radius_m {
                params.push(("radius", radius.to_string()));
            }
        }
        params
    }
}

/// Response envelope from the geocode endpoint
#[derive(Deserialize)]
struct GeocodeEnvelope {
    #[serde(default)]
    results: Vec<GeocodeResponse>,
    status: Option<String>,
    error_message: Option<String>,
}

#[async_trait]
impl GeocodeProvider for HttpGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Vec<GeocodeResponse>, GeocodeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GeocodeError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    GeocodeError::Timeout(self.timeout_secs)
                } else {
                    GeocodeError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GeocodeEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeocodeError::Timeout(self.timeout_secs)
            } else {
                GeocodeError::ResponseParsing(e.to_string())
            }
        })?;

        match envelope.status.as_deref() {
            None | Some(STATUS_OK) => Ok(envelope.results),
            Some(STATUS_ZERO_RESULTS) => Ok(Vec::new()),
            Some(other) => Err(GeocodeError::ProviderStatus(match envelope.error_message {
                Some(message) => format!("{other}: {message}"),
                None => other.to_string(),
            })),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Mock provider
// ═══════════════════════════════════════════════════════════

/// Scripted provider for testing.
///
/// Addresses are matched exactly. Unknown addresses answer with no results.
#[derive(Default)]
pub struct MockGeocoder {
    responses: HashMap<String, Vec<GeocodeResponse>>,
    failures: HashSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GeocodeRequest>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `address` with a single result.
    pub fn with_response(self, address: &str, response: GeocodeResponse) -> Self {
        self.with_responses(address, vec![response])
    }

    pub fn with_responses(mut self, address: &str, responses: Vec<GeocodeResponse>) -> Self {
        self.responses.insert(address.to_string(), responses);
        self
    }

    /// Fail lookups of `address` with a connection error.
    pub fn with_failure(mut self, address: &str) -> Self {
        self.failures.insert(address.to_string());
        self
    }

    /// Fail every lookup with a connection error.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Sleep before answering each lookup.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Addresses looked up so far, in call order.
    pub fn requested_addresses(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|reqs| reqs.iter().map(|r| r.address.clone()).collect())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<GeocodeRequest> {
        self.requests.lock().map(|reqs| reqs.clone()).unwrap_or_default()
    }

    /// Build a result centred on `location` with a square viewport `span_deg` wide.
    pub fn result(formatted: &str, types: &[&str], location: LatLng, span_deg: f64) -> GeocodeResponse {
        let half = span_deg / 2.0;
        GeocodeResponse {
            formatted_address: formatted.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            geometry: Geometry {
                location,
                viewport: Viewport {
                    northeast: LatLng::new(location.lat + half, location.lng + half),
                    southwest: LatLng::new(location.lat - half, location.lng - half),
                },
            },
        }
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocoder {
    async fn geocode(&self, request: &GeocodeRequest) -> Result<Vec<GeocodeResponse>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_all || self.failures.contains(&request.address) {
            return Err(GeocodeError::Connection("mock".to_string()));
        }

        Ok(self.responses.get(&request.address).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn fake_geocode(Query(params): Query<HashMap<String, String>>) -> Response {
        let address = params.get("address").cloned().unwrap_or_default();
        match address.as_str() {
            "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
            "denied" => Json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "results": []
            }))
            .into_response(),
            "nowhere" => Json(json!({"status": "ZERO_RESULTS", "results": []})).into_response(),
            "garbage" => "definitely not json".into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"status": "OK", "results": []})).into_response()
            }
            _ => {
                // Echo the query back so tests can inspect what was sent.
                let echo = format!(
                    "{address}|{}|{}|{}",
                    params.get("location").cloned().unwrap_or_default(),
                    params.get("radius").cloned().unwrap_or_default(),
                    params.get("key").cloned().unwrap_or_default(),
                );
                Json(json!({
                    "status": "OK",
                    "results": [{
                        "formatted_address": echo,
                        "types": ["street_address"],
                        "geometry": {
                            "location": {"lat": 51.5033, "lng": -0.1196},
                            "location_type": "ROOFTOP",
                            "viewport": {
                                "northeast": {"lat": 51.5046, "lng": -0.1182},
                                "southwest": {"lat": 51.5019, "lng": -0.1209}
                            }
                        }
                    }]
                }))
                .into_response()
            }
        }
    }

    async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new().route("/geocode/json", get(fake_geocode));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/geocode/json"), server)
    }

    fn config_for(base_url: &str) -> GeocoderConfig {
        GeocoderConfig {
            base_url: base_url.to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 1,
            search_radius_m: 1000,
        }
    }

    #[test]
    fn default_endpoint_requires_key() {
        let result = HttpGeocoder::new(&GeocoderConfig::default());
        assert!(matches!(result, Err(GeocodeError::MissingApiKey)));
    }

    #[test]
    fn custom_endpoint_without_key_is_allowed() {
        let config = GeocoderConfig {
            base_url: "http://localhost:9999/geocode/".to_string(),
            ..GeocoderConfig::default()
        };
        let geocoder = HttpGeocoder::new(&config).unwrap();
        assert_eq!(geocoder.base_url(), "http://localhost:9999/geocode");
    }

    #[test]
    fn bias_params_only_with_location() {
        let geocoder = HttpGeocoder::new(&config_for("http://localhost:1")).unwrap();
        let plain = geocoder.query_params(&GeocodeRequest::new("x"));
        assert_eq!(plain.len(), 2);
        let biased = geocoder.query_params(
            &GeocodeRequest::new("x").with_bias(LatLng::new(51.5, -0.12), 800),
        );
        assert!(biased.contains(&("location", "51.5,-0.12".to_string())));
        assert!(biased.contains(&("radius", "800".to_string())));
    }

    #[tokio::test]
    async fn http_geocoder_parses_results_and_sends_bias() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();

        let request = GeocodeRequest::new("19 Peace Court").with_bias(LatLng::new(51.5, -0.12), 1000);
        let results = geocoder.geocode(&request).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].formatted_address,
            "19 Peace Court|51.5,-0.12|1000|test-key"
        );
        assert!(results[0].has_type("street_address"));
        server.abort();
    }

    #[tokio::test]
    async fn zero_results_is_empty_not_error() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();
        let results = geocoder.geocode(&GeocodeRequest::new("nowhere")).await.unwrap();
        assert!(results.is_empty());
        server.abort();
    }

    #[tokio::test]
    async fn non_ok_status_is_provider_status_error() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();
        match geocoder.geocode(&GeocodeRequest::new("denied")).await {
            Err(GeocodeError::ProviderStatus(msg)) => assert!(msg.starts_with("REQUEST_DENIED")),
            other => panic!("Expected ProviderStatus, got: {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();
        match geocoder.geocode(&GeocodeRequest::new("boom")).await {
            Err(GeocodeError::Provider { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("Expected Provider error, got: {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();
        let result = geocoder.geocode(&GeocodeRequest::new("garbage")).await;
        assert!(matches!(result, Err(GeocodeError::ResponseParsing(_))));
        server.abort();
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let (url, server) = spawn_server().await;
        let geocoder = HttpGeocoder::new(&config_for(&url)).unwrap();
        let result = geocoder.geocode(&GeocodeRequest::new("slow")).await;
        assert!(matches!(result, Err(GeocodeError::Timeout(1))), "got {result:?}");
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_provider_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let geocoder = HttpGeocoder::new(&config_for(&format!("http://{addr}/geocode/json"))).unwrap();
        let result = geocoder.geocode(&GeocodeRequest::new("x")).await;
        assert!(matches!(result, Err(GeocodeError::Connection(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn mock_returns_scripted_results_and_counts_calls() {
        let hit = MockGeocoder::result("Peace Ct, London SE1", &["premise"], LatLng::new(51.5, -0.1), 0.001);
        let mock = MockGeocoder::new()
            .with_response("19 Peace Court", hit.clone())
            .with_failure("broken");

        assert_eq!(mock.geocode(&GeocodeRequest::new("19 Peace Court")).await.unwrap(), vec![hit]);
        assert!(mock.geocode(&GeocodeRequest::new("unknown")).await.unwrap().is_empty());
        assert!(mock.geocode(&GeocodeRequest::new("broken")).await.is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.requested_addresses(), vec!["19 Peace Court", "unknown", "broken"]);
    }

    #[tokio::test]
    async fn failing_mock_fails_everything() {
        let mock = MockGeocoder::failing();
        assert!(mock.geocode(&GeocodeRequest::new("anything")).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn mock_result_viewport_is_centred() {
        let r = MockGeocoder::result("x", &[], LatLng::new(51.5, -0.1), 0.002);
        assert!((r.geometry.viewport.area_deg2() - 4e-6).abs() < 1e-12);
    }
}
