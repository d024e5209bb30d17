use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// `"lat,lng"` form used for provider location-bias hints.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Bounding rectangle attached to a result; smaller means more precise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

impl Viewport {
    /// Area in square degrees. Cheap and monotonic enough for thresholding.
    pub fn area_deg2(&self) -> f64 {
        let lat_span = (self.northeast.lat - self.southwest.lat).abs();
        let lng_span = (self.northeast.lng - self.southwest.lng).abs();
        lat_span * lng_span
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    pub viewport: Viewport,
}

/// One provider result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub formatted_address: String,
    /// Semantic tags such as `street_address`, `premise`, `route`, `locality`.
    #[serde(default)]
    pub types: Vec<String>,
    pub geometry: Geometry,
}

impl GeocodeResponse {
    pub fn has_type(&self, tag: &str) -> bool {
        self.types.iter().any(|t| t == tag)
    }

    pub fn location(&self) -> LatLng {
        self.geometry.location
    }
}

/// A single lookup issued to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeRequest {
    pub address: String,
    /// Location-bias hint.
    pub location: Option<LatLng>,
    /// Bias radius in metres; only sent together with `location`.
    pub radius_m: Option<u32>,
}

impl GeocodeRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            location: None,
            radius_m: None,
        }
    }

    pub fn with_bias(mut self, location: LatLng, radius_m: u32) -> Self {
        self.location = Some(location);
        self.radius_m = Some(radius_m);
        self
    }
}

/// A provider result together with the candidate that produced it and its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub candidate: String,
    pub response: GeocodeResponse,
    /// Always within `[0, 1]`.
    pub confidence: f32,
}

/// Outcome of a resolution request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Best result met the acceptance threshold.
    Resolved(ScoredResult),
    /// Something was found but below the acceptance threshold.
    LowConfidence(ScoredResult),
    /// No candidate produced any result.
    Unresolved,
}

impl Resolution {
    pub fn from_best(best: Option<ScoredResult>, accept_threshold: f32) -> Self {
        match best {
            Some(result) if result.confidence >= accept_threshold => Self::Resolved(result),
            Some(result) => Self::LowConfidence(result),
            None => Self::Unresolved,
        }
    }

    /// The best result, if anything was found at all.
    pub fn best(&self) -> Option<&ScoredResult> {
        match self {
            Self::Resolved(r) | Self::LowConfidence(r) => Some(r),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}
