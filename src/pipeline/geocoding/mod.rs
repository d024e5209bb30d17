pub mod types;
pub mod overrides;
pub mod candidates;
pub mod confidence;
pub mod cache;
pub mod client;
pub mod resolver;

pub use types::*;
pub use candidates::generate_candidates;
pub use confidence::{applied_rules, score, thresholds};
pub use cache::{CacheEntry, CacheKey, CacheStats, ResolutionCache};
pub use client::{GeocodeProvider, HttpGeocoder, MockGeocoder};
pub use resolver::GeocodeResolver;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Cannot connect to geocoder at {0}")]
    Connection(String),

    #[error("Geocoder request timed out after {0}s")]
    Timeout(u64),

    #[error("Geocoder returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Geocoder returned status {0}")]
    ProviderStatus(String),

    #[error("Failed to parse geocoder response: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("No geocoder API key configured")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_readable() {
        let err = GeocodeError::Provider {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "Geocoder returned HTTP 503: unavailable");
        assert_eq!(
            GeocodeError::Timeout(5).to_string(),
            "Geocoder request timed out after 5s"
        );
    }

    #[test]
    fn config_errors_convert() {
        let err: GeocodeError = ConfigError::InvalidValue {
            var: "PLACEFINDER_SEARCH_RADIUS_M",
            value: "far".into(),
        }
        .into();
        assert!(matches!(err, GeocodeError::Config(_)));
    }
}
