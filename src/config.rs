use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Placefinder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Google-compatible geocode endpoint used when nothing else is configured.
pub const DEFAULT_GEOCODER_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const ENV_GEOCODER_URL: &str = "PLACEFINDER_GEOCODER_URL";
const ENV_GEOCODER_KEY: &str = "PLACEFINDER_GEOCODER_KEY";
const ENV_GOOGLE_KEY: &str = "GOOGLE_MAPS_API_KEY";
const ENV_TIMEOUT_SECS: &str = "PLACEFINDER_GEOCODER_TIMEOUT_SECS";
const ENV_RADIUS_M: &str = "PLACEFINDER_SEARCH_RADIUS_M";

/// Log filter applied when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "placefinder=info"
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

// ═══════════════════════════════════════════════════════════
// Geocoder provider settings
// ═══════════════════════════════════════════════════════════

/// Connection settings for the HTTP geocoding provider.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout_secs: u64,
    /// Radius sent alongside a location-bias hint.
    pub search_radius_m: u32,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            api_key: None,
            timeout_secs: 5,
            search_radius_m: 1000,
        }
    }
}

impl GeocoderConfig {
    /// Build from process environment, falling back to defaults per field.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let base_url = non_empty(ENV_GEOCODER_URL).unwrap_or(defaults.base_url);
        let api_key = non_empty(ENV_GEOCODER_KEY).or_else(|| non_empty(ENV_GOOGLE_KEY));
        let timeout_secs = match non_empty(ENV_TIMEOUT_SECS) {
            Some(raw) => parse_var(ENV_TIMEOUT_SECS, &raw)?,
            None => defaults.timeout_secs,
        };
        let search_radius_m = match non_empty(ENV_RADIUS_M) {
            Some(raw) => parse_var(ENV_RADIUS_M, &raw)?,
            None => defaults.search_radius_m,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout_secs,
            search_radius_m,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════
// Resolver settings
// ═══════════════════════════════════════════════════════════

/// Thresholds and limits for candidate-by-candidate resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverConfig {
    /// Results at or above this confidence are reported as resolved.
    pub accept_threshold: f32,
    /// A result strictly above this confidence stops candidate iteration.
    pub early_exit_threshold: f32,
    /// Upper bound on a single provider lookup.
    pub lookup_timeout_secs: u64,
    /// Radius sent with the reference location as a bias hint.
    pub search_radius_m: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            accept_threshold: crate::pipeline::geocoding::confidence::thresholds::ACCEPT,
            early_exit_threshold: crate::pipeline::geocoding::confidence::thresholds::EARLY_EXIT,
            lookup_timeout_secs: 5,
            search_radius_m: 1000,
        }
    }
}

impl ResolverConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl From<&GeocoderConfig> for ResolverConfig {
    fn from(geocoder: &GeocoderConfig) -> Self {
        Self {
            lookup_timeout_secs: geocoder.timeout_secs,
            search_radius_m: geocoder.search_radius_m,
            ..Self::default()
        }
    }
}
