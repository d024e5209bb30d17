//! Deterministic confidence scoring for geocoder results.
//!
//! The score starts at [`BASE_SCORE`] and each rule in [`SCORING_RULES`] whose
//! predicate holds adds its delta. Rules are evaluated in table order and the
//! total is clamped to `[0, 1]`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::overrides::is_expected_formatted;
use super::types::{GeocodeResponse, LatLng};
use crate::pipeline::extraction::gazetteer::is_known_area_code;

/// Confidence thresholds used by the resolver and callers
pub mod thresholds {
    /// Below this: almost certainly the wrong place.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: more likely wrong than right.
    pub const LOW: f32 = 0.50;

    /// At or above this: reported as resolved.
    pub const ACCEPT: f32 = 0.70;

    /// Above this: high confidence.
    pub const HIGH: f32 = 0.85;

    /// Strictly above this: stop trying further candidates.
    pub const EARLY_EXIT: f32 = 0.95;
}

pub const BASE_SCORE: f32 = 0.5;

/// Viewports smaller than this (square degrees) count as precise.
pub const TIGHT_VIEWPORT_DEG2: f64 = 1e-5;
/// Viewports larger than this (square degrees) count as imprecise.
pub const WIDE_VIEWPORT_DEG2: f64 = 1e-2;

pub const NEAR_REFERENCE_M: f64 = 500.0;
pub const AROUND_REFERENCE_M: f64 = 5_000.0;

const PRECISE_TAGS: &[&str] = &["street_address"];
const PREMISE_TAGS: &[&str] = &["premise", "subpremise", "establishment"];
const ROUTE_TAGS: &[&str] = &["route"];
const COARSE_TAGS: &[&str] = &[
    "locality",
    "sublocality",
    "neighborhood",
    "postal_code",
    "postal_town",
    "political",
    "country",
    "administrative_area_level_1",
    "administrative_area_level_2",
    "administrative_area_level_3",
];

/// House-number tokens: digits optionally followed by one letter (`19`, `221B`).
/// Postcode parts such as `SE1` or `9TG` are not counted.
static NUMBER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)[A-Za-z]?\b").expect("valid number token regex"));

/// A bare road designation such as `A232`, `M25` or `A3(M)`.
static ROAD_ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,2}\d{1,4}(?:\([A-Z]\))?$").expect("valid road route regex")
});

/// Everything a rule may look at.
pub struct ScoringContext<'a> {
    pub response: &'a GeocodeResponse,
    pub original_address: &'a str,
    pub reference: Option<LatLng>,
}

/// A named `(predicate, delta)` pair.
pub struct ScoringRule {
    pub name: &'static str,
    pub delta: f32,
    pub applies: fn(&ScoringContext<'_>) -> bool,
}

pub static SCORING_RULES: &[ScoringRule] = &[
    ScoringRule { name: "precise_street_address", delta: 0.30, applies: is_precise },
    ScoringRule { name: "premise_level", delta: 0.20, applies: is_premise },
    ScoringRule { name: "route_level", delta: 0.10, applies: is_route },
    ScoringRule { name: "locality_only", delta: -0.20, applies: is_locality_only },
    ScoringRule { name: "tight_viewport", delta: 0.10, applies: has_tight_viewport },
    ScoringRule { name: "wide_viewport", delta: -0.15, applies: has_wide_viewport },
    ScoringRule { name: "house_numbers_agree", delta: 0.15, applies: numbers_agree },
    ScoringRule { name: "house_numbers_conflict", delta: -0.20, applies: numbers_conflict },
    ScoringRule { name: "near_reference", delta: 0.15, applies: is_near_reference },
    ScoringRule { name: "around_reference", delta: 0.05, applies: is_around_reference },
    ScoringRule { name: "known_override_confirmed", delta: 0.10, applies: is_override_confirmed },
    ScoringRule { name: "road_route_lookalike", delta: -0.70, applies: looks_like_road_route },
];

/// Score `response` against the address that produced it.
pub fn score(response: &GeocodeResponse, original_address: &str, reference: Option<LatLng>) -> f32 {
    let ctx = ScoringContext {
        response,
        original_address,
        reference,
    };
    let total: f32 = SCORING_RULES
        .iter()
        .filter(|rule| (rule.applies)(&ctx))
        .map(|rule| rule.delta)
        .sum();
    (BASE_SCORE + total).clamp(0.0, 1.0)
}

/// Names of the rules that fired, in evaluation order.
pub fn applied_rules(
    response: &GeocodeResponse,
    original_address: &str,
    reference: Option<LatLng>,
) -> Vec<&'static str> {
    let ctx = ScoringContext {
        response,
        original_address,
        reference,
    };
    SCORING_RULES
        .iter()
        .filter(|rule| (rule.applies)(&ctx))
        .map(|rule| rule.name)
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════

fn has_any(response: &GeocodeResponse, tags: &[&str]) -> bool {
    tags.iter().any(|t| response.has_type(t))
}

fn is_precise(ctx: &ScoringContext<'_>) -> bool {
    has_any(ctx.response, PRECISE_TAGS)
}

fn is_premise(ctx: &ScoringContext<'_>) -> bool {
    has_any(ctx.response, PREMISE_TAGS)
}

fn is_route(ctx: &ScoringContext<'_>) -> bool {
    has_any(ctx.response, ROUTE_TAGS)
}

fn is_locality_only(ctx: &ScoringContext<'_>) -> bool {
    let types = &ctx.response.types;
    !types.is_empty() && types.iter().all(|t| COARSE_TAGS.contains(&t.as_str()))
}

fn has_tight_viewport(ctx: &ScoringContext<'_>) -> bool {
    ctx.response.geometry.viewport.area_deg2() < TIGHT_VIEWPORT_DEG2
}

fn has_wide_viewport(ctx: &ScoringContext<'_>) -> bool {
    ctx.response.geometry.viewport.area_deg2() > WIDE_VIEWPORT_DEG2
}

fn number_tokens(text: &str) -> HashSet<String> {
    NUMBER_TOKEN_RE
        .captures_iter(text)
        .map(|caps| {
            let digits = caps[1].trim_start_matches('0');
            if digits.is_empty() { "0".to_string() } else { digits.to_string() }
        })
        .collect()
}

fn numbers_agree(ctx: &ScoringContext<'_>) -> bool {
    let original = number_tokens(ctx.original_address);
    let formatted = number_tokens(&ctx.response.formatted_address);
    !original.is_disjoint(&formatted)
}

fn numbers_conflict(ctx: &ScoringContext<'_>) -> bool {
    let original = number_tokens(ctx.original_address);
    let formatted = number_tokens(&ctx.response.formatted_address);
    !original.is_empty() && !formatted.is_empty() && original.is_disjoint(&formatted)
}

fn reference_distance(ctx: &ScoringContext<'_>) -> Option<f64> {
    ctx.reference
        .map(|reference| reference.distance_m(&ctx.response.location()))
}

fn is_near_reference(ctx: &ScoringContext<'_>) -> bool {
    reference_distance(ctx).is_some_and(|d| d <= NEAR_REFERENCE_M)
}

fn is_around_reference(ctx: &ScoringContext<'_>) -> bool {
    reference_distance(ctx).is_some_and(|d| d > NEAR_REFERENCE_M && d <= AROUND_REFERENCE_M)
}

fn is_override_confirmed(ctx: &ScoringContext<'_>) -> bool {
    is_expected_formatted(ctx.original_address, &ctx.response.formatted_address)
}

/// A response tagged `street_address` is never a bare road designation.
fn looks_like_road_route(ctx: &ScoringContext<'_>) -> bool {
    if is_precise(ctx) {
        return false;
    }
    let head = ctx
        .response
        .formatted_address
        .split(',')
        .next()
        .unwrap_or_default()
        .trim();
    ROAD_ROUTE_RE.is_match(head) && !is_known_area_code(head)
}
