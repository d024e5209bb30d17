//! Place resolution orchestrator.
//!
//! Single entry point that drives the full pipeline:
//! normalize → correct → extract → candidates → resolve → score.
//!
//! The geocoding backend is injected as a `GeocodeProvider`, so the
//! orchestrator is fully testable with `MockGeocoder`.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{GeocoderConfig, ResolverConfig};
use crate::pipeline::extraction::gazetteer::mentioned_locality;
use crate::pipeline::extraction::{
    correct_ocr_errors, enhance_with_locality, extract_fields, normalize, ExtractedFields,
};
use crate::pipeline::geocoding::{
    generate_candidates, GeocodeError, GeocodeProvider, GeocodeResolver, HttpGeocoder, LatLng,
    Resolution,
};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Everything learned while resolving one block of OCR text.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOutcome {
    pub fields: ExtractedFields,
    /// The address string handed to candidate generation; empty when the
    /// text offered nothing to geocode.
    pub query: String,
    pub candidates: Vec<String>,
    pub resolution: Resolution,
}

/// Which extracted field the geocoding query was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuerySource {
    Address,
    Postcode,
    BusinessName,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct PlaceResolver {
    resolver: GeocodeResolver,
}

impl PlaceResolver {
    pub fn new(resolver: GeocodeResolver) -> Self {
        Self { resolver }
    }

    /// Default resolver settings and the process-wide cache.
    pub fn with_provider(provider: Arc<dyn GeocodeProvider>) -> Self {
        Self::new(GeocodeResolver::new(provider))
    }

    /// HTTP provider configured from the environment.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let config = GeocoderConfig::from_env()?;
        let provider = HttpGeocoder::new(&config)?;
        let resolver = GeocodeResolver::new(Arc::new(provider)).with_config(ResolverConfig::from(&config));
        Ok(Self::new(resolver))
    }

    pub fn resolver(&self) -> &GeocodeResolver {
        &self.resolver
    }

    /// Resolve raw OCR text.
    ///
    /// The query is the extracted street address if there is one, else the
    /// postcode, else the business name. With none of those the outcome is
    /// `Unresolved` and the provider is never called.
    pub async fn resolve_text(&self, raw: &str, reference: Option<LatLng>) -> PlaceOutcome {
        let fields = extract_fields(raw);

        let Some((source, query)) = build_query(&fields, raw) else {
            tracing::info!(text_len = raw.len(), "Nothing to geocode in text");
            return PlaceOutcome {
                fields,
                query: String::new(),
                candidates: Vec::new(),
                resolution: Resolution::Unresolved,
            };
        };

        tracing::debug!(?source, query = %query, "Built geocoding query");
        let candidates = generate_candidates(&query);
        let resolution = self.resolve_candidates(&candidates, reference).await;

        PlaceOutcome {
            fields,
            query,
            candidates,
            resolution,
        }
    }

    /// Resolve an address string that has already been extracted.
    pub async fn resolve_address(&self, address: &str, reference: Option<LatLng>) -> Resolution {
        let address = address.trim();
        if address.is_empty() {
            return Resolution::Unresolved;
        }
        let candidates = generate_candidates(&enhance_with_locality(address));
        self.resolve_candidates(&candidates, reference).await
    }

    async fn resolve_candidates(&self, candidates: &[String], reference: Option<LatLng>) -> Resolution {
        let best = self.resolver.resolve(candidates, reference).await;
        Resolution::from_best(best, self.resolver.config().accept_threshold)
    }
}

fn build_query(fields: &ExtractedFields, raw: &str) -> Option<(QuerySource, String)> {
    if !fields.address.is_empty() {
        return Some((QuerySource::Address, fields.address.clone()));
    }
    if !fields.postcode.is_empty() {
        return Some((QuerySource::Postcode, enhance_with_locality(&fields.postcode)));
    }
    if !fields.business_name.is_empty() {
        let text = correct_ocr_errors(&normalize(raw));
        let query = match mentioned_locality(&text) {
            Some(loc) if mentioned_locality(&fields.business_name).is_none() => {
                format!("{}, {}", fields.business_name, loc.name)
            }
            _ => fields.business_name.clone(),
        };
        return Some((QuerySource::BusinessName, query));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::geocoding::{MockGeocoder, ResolutionCache};

    const SE1: LatLng = LatLng { lat: 51.5033, lng: -0.1196 };

    fn processor(mock: &Arc<MockGeocoder>) -> PlaceResolver {
        PlaceResolver::new(GeocodeResolver::new(mock.clone()).with_cache(Arc::new(ResolutionCache::new())))
    }

    #[tokio::test]
    async fn resolves_garbled_sign_text() {
        let hit = MockGeocoder::result("Peace Ct, London SE1 7XX, UK", &["premise"], SE1, 0.001);
        let mock = Arc::new(MockGeocoder::new().with_response("19 Peace Court, London SE1", hit));
        let place = processor(&mock);

        let outcome = place.resolve_text("19 Peace Court London SEISTR", Some(SE1)).await;

        assert_eq!(outcome.query, "19 Peace Court, London SE1");
        assert!(outcome.candidates.contains(&"Peace Court, London SE1".to_string()));
        match &outcome.resolution {
            Resolution::Resolved(result) => {
                assert_eq!(result.candidate, "19 Peace Court, London SE1");
                assert!(result.confidence >= 0.7);
            }
            other => panic!("Expected Resolved, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn falls_back_to_postcode() {
        let mock = Arc::new(MockGeocoder::new());
        let place = processor(&mock);

        let outcome = place.resolve_text("Open daily\nSE1 9TG", None).await;

        assert!(outcome.fields.address.is_empty());
        assert_eq!(outcome.query, "SE1 9TG, London");
        assert_eq!(mock.requested_addresses()[0], "SE1 9TG, London");
    }

    #[tokio::test]
    async fn falls_back_to_business_name_with_locality() {
        let mock = Arc::new(MockGeocoder::new());
        let place = processor(&mock);

        let outcome = place.resolve_text("Monmouth Coffee\nLondon", None).await;

        assert_eq!(outcome.fields.business_name, "Monmouth Coffee");
        assert_eq!(outcome.query, "Monmouth Coffee, London");
        assert_eq!(mock.requested_addresses()[0], "Monmouth Coffee, London");
    }

    #[tokio::test]
    async fn empty_text_is_unresolved_without_calls() {
        let mock = Arc::new(MockGeocoder::new());
        let place = processor(&mock);

        for raw in ["", "  \n\t ", "~~ ## ~~"] {
            let outcome = place.resolve_text(raw, None).await;
            assert!(outcome.resolution.is_unresolved());
            assert!(outcome.candidates.is_empty());
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn weak_match_is_low_confidence_not_unresolved() {
        let coarse = MockGeocoder::result("London, UK", &["locality", "political"], SE1, 0.5);
        let mock = Arc::new(MockGeocoder::new().with_response("Baker Street", coarse));
        let place = processor(&mock);

        let resolution = place.resolve_address("Baker Street", None).await;
        assert!(matches!(resolution, Resolution::LowConfidence(_)));
    }

    #[tokio::test]
    async fn provider_outage_is_unresolved() {
        let mock = Arc::new(MockGeocoder::failing());
        let place = processor(&mock);

        let resolution = place.resolve_address("221B Baker Street NW1", None).await;
        assert!(resolution.is_unresolved());
        assert!(mock.call_count() > 0);
    }

    #[tokio::test]
    async fn blank_address_skips_provider() {
        let mock = Arc::new(MockGeocoder::new());
        let place = processor(&mock);
        assert!(place.resolve_address("   ", None).await.is_unresolved());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn address_gets_locality_before_candidates() {
        let mock = Arc::new(MockGeocoder::new());
        let place = processor(&mock);

        place.resolve_address("8 Borough High Street SE1", None).await;
        assert_eq!(mock.requested_addresses()[0], "8 Borough High Street SE1, London");
    }

    #[test]
    fn query_prefers_address_over_postcode() {
        let fields = ExtractedFields {
            address: "19 Peace Court, London SE1".into(),
            postcode: "SE1".into(),
            business_name: "Peace Cafe".into(),
            ..ExtractedFields::default()
        };
        assert_eq!(
            build_query(&fields, ""),
            Some((QuerySource::Address, "19 Peace Court, London SE1".to_string()))
        );
    }

    #[test]
    fn business_name_already_naming_locality_is_kept() {
        let fields = ExtractedFields {
            business_name: "London Coffee Shop".into(),
            ..ExtractedFields::default()
        };
        assert_eq!(
            build_query(&fields, "London Coffee Shop"),
            Some((QuerySource::BusinessName, "London Coffee Shop".to_string()))
        );
    }
}
