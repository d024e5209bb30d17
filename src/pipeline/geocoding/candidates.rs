//! Alternative address strings to try against the geocoder.
//!
//! Output order is the order the resolver tries candidates in, so more
//! specific variants are generated before looser ones. Rules only append;
//! earlier candidates are never rewritten.

use std::sync::LazyLock;

use regex::Regex;

use super::overrides::override_candidates;
use crate::pipeline::extraction::gazetteer::{find_area_code, mentioned_locality, missing_locality};
use crate::pipeline::extraction::ocr_correction::correct_ocr_errors;

/// Country suffix appended to addresses that do not already carry one.
pub const COUNTRY_SUFFIX: &str = "UK";

static COUNTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:UK|U\.K\.|United Kingdom|GB|Great Britain|England)\b")
        .expect("valid country regex")
});

/// Generate deduplicated candidates. The first element is always `address`.
pub fn generate_candidates(address: &str) -> Vec<String> {
    let mut candidates = vec![address.to_string()];
    if address.trim().is_empty() {
        return candidates;
    }

    for candidate in override_candidates(address) {
        push_unique(&mut candidates, candidate);
    }

    if let Some(loc) = missing_locality(address) {
        push_unique(&mut candidates, format!("{address}, {}", loc.name));
    }

    if let Some(loc) = mentioned_locality(address) {
        if find_area_code(address).is_none() {
            for code in loc.plausible_area_codes {
                push_unique(&mut candidates, format!("{address} {code}"));
            }
        }
    }

    let comma_stripped = strip_commas(address);
    if comma_stripped != address {
        push_unique(&mut candidates, comma_stripped);
    }

    if !COUNTRY_RE.is_match(address) {
        push_unique(&mut candidates, format!("{address}, {COUNTRY_SUFFIX}"));
    }

    let corrected = correct_ocr_errors(address);
    if corrected != address {
        push_unique(&mut candidates, corrected);
    }

    tracing::debug!(count = candidates.len(), "Generated address candidates");
    candidates
}

fn strip_commas(address: &str) -> String {
    address
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_unique(candidates: &mut Vec<String>, candidate: String) {
    if !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_duplicates(candidates: &[String]) {
        for (i, c) in candidates.iter().enumerate() {
            assert!(
                !candidates[i + 1..].contains(c),
                "duplicate candidate {c:?} in {candidates:?}"
            );
        }
    }

    #[test]
    fn first_candidate_is_input_unmodified() {
        for address in ["19 Peace Court, London SE1", "  odd  spacing ", "A232", "x"] {
            let candidates = generate_candidates(address);
            assert_eq!(candidates[0], address);
            assert_no_duplicates(&candidates);
        }
    }

    #[test]
    fn peace_court_gets_override_early() {
        let candidates = generate_candidates("19 Peace Court, London SE1");
        assert_eq!(
            candidates,
            vec![
                "19 Peace Court, London SE1",
                "Peace Court, London SE1",
                "19 Peace Court London SE1",
                "19 Peace Court, London SE1, UK",
            ]
        );
    }

    #[test]
    fn area_code_without_locality_adds_locality() {
        let candidates = generate_candidates("8 Borough High Street SE1");
        assert_eq!(candidates[1], "8 Borough High Street SE1, London");
        assert!(candidates.contains(&"8 Borough High Street SE1, UK".to_string()));
    }

    #[test]
    fn locality_without_area_code_adds_plausible_codes() {
        let candidates = generate_candidates("12 Exmouth Market, London");
        assert_eq!(candidates[1], "12 Exmouth Market, London SE1");
        assert_eq!(candidates[2], "12 Exmouth Market, London EC1");
        assert!(candidates.contains(&"12 Exmouth Market London".to_string()));
    }

    #[test]
    fn country_suffix_not_duplicated() {
        let candidates = generate_candidates("10 Downing Street, London SW1A 2AA, UK");
        assert!(!candidates.iter().any(|c| c.ends_with("UK, UK")));
        let candidates = generate_candidates("10 Downing Street, London, United Kingdom");
        assert!(!candidates.iter().any(|c| c.ends_with(", UK")));
    }

    #[test]
    fn ocr_corrected_variant_is_appended() {
        let candidates = generate_candidates("Flat 1O Baker Streel");
        assert_eq!(candidates.last().unwrap(), "Flat 10 Baker Street");
    }

    #[test]
    fn garbled_peace_court_includes_override() {
        let candidates = generate_candidates("19 Peace Court London SEISTR");
        assert!(candidates.contains(&"Peace Court, London SE1".to_string()));
        assert!(candidates.contains(&"19 Peace Court London SE1".to_string()));
    }

    #[test]
    fn comma_free_address_has_no_stripped_variant() {
        let candidates = generate_candidates("221B Baker Street NW1");
        assert_eq!(
            candidates,
            vec![
                "221B Baker Street NW1",
                "221B Baker Street NW1, London",
                "221B Baker Street NW1, UK",
            ]
        );
    }

    #[test]
    fn empty_address_yields_only_itself() {
        assert_eq!(generate_candidates(""), vec![String::new()]);
        assert_eq!(generate_candidates("   "), vec!["   ".to_string()]);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_candidates("The 02 Arena, London");
        let b = generate_candidates("The 02 Arena, London");
        assert_eq!(a, b);
        assert_no_duplicates(&a);
    }
}
