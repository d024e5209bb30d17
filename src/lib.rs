pub mod config;
pub mod pipeline;

pub use pipeline::extraction::ExtractedFields;
pub use pipeline::geocoding::{
    GeocodeError, GeocodeProvider, GeocodeResolver, GeocodeResponse, HttpGeocoder, LatLng,
    MockGeocoder, Resolution, ResolutionCache, ScoredResult,
};
pub use pipeline::processor::{PlaceOutcome, PlaceResolver};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`config::default_log_filter`]. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
}
