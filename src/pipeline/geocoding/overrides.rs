//! Hand-maintained overrides for venues that geocode poorly.
//!
//! Each entry pairs an address pattern with explicit candidate addresses to
//! try and the formatted addresses that confirm a correct hit. Candidate
//! generation and scoring both read this table, so adding a venue is a data
//! change only.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug)]
pub struct AddressOverride {
    pub name: &'static str,
    pattern: &'static str,
    /// Disambiguated addresses, tried in order right after the input address.
    pub candidates: &'static [&'static str],
    /// Formatted-address prefixes that confirm the override resolved correctly.
    pub expected_formatted: &'static [&'static str],
}

pub static ADDRESS_OVERRIDES: &[AddressOverride] = &[
    AddressOverride {
        name: "peace-court",
        pattern: r"(?i)\bpeace\s+(?:court|ct)\b",
        candidates: &["Peace Court, London SE1"],
        expected_formatted: &["Peace Ct, London SE1", "Peace Court, London SE1"],
    },
    AddressOverride {
        name: "tate-modern",
        pattern: r"(?i)\btate\s+modern\b",
        candidates: &["Tate Modern, Bankside, London SE1 9TG"],
        expected_formatted: &["Tate Modern, Bankside, London SE1 9TG"],
    },
    AddressOverride {
        name: "globe-theatre",
        pattern: r"(?i)\bshakespeare'?s\s+globe\b|\bglobe\s+theatre\b",
        candidates: &["Shakespeare's Globe, 21 New Globe Walk, London SE1 9DT"],
        expected_formatted: &["Shakespeare's Globe, 21 New Globe Walk, London SE1 9DT"],
    },
    AddressOverride {
        name: "borough-market",
        pattern: r"(?i)\bborough\s+market\b",
        candidates: &["Borough Market, 8 Southwark Street, London SE1 1TL"],
        expected_formatted: &["8 Southwark St, London SE1 1TL", "Borough Market, 8 Southwark St"],
    },
    AddressOverride {
        // OCR turns the O of O2 into a zero.
        name: "the-o2",
        pattern: r"(?i)\bthe\s+[o0]2\b|\b[o0]2\s+arena\b",
        candidates: &[
            "The O2, Peninsula Square, London SE10 0DX",
            "Peninsula Square, London SE10 0DX",
        ],
        expected_formatted: &["Peninsula Square, London SE10 0DX", "The O2, Peninsula Square"],
    },
];

static COMPILED_OVERRIDES: LazyLock<Vec<(Regex, &'static AddressOverride)>> = LazyLock::new(|| {
    ADDRESS_OVERRIDES
        .iter()
        .map(|o| (Regex::new(o.pattern).expect("valid override regex"), o))
        .collect()
});

/// Overrides whose pattern matches `address`, in table order.
pub fn matching_overrides(address: &str) -> impl Iterator<Item = &'static AddressOverride> + '_ {
    COMPILED_OVERRIDES
        .iter()
        .filter(move |(re, _)| re.is_match(address))
        .map(|(_, o)| *o)
}

/// Explicit candidate addresses for `address`, in table order.
pub fn override_candidates(address: &str) -> Vec<String> {
    matching_overrides(address)
        .flat_map(|o| o.candidates.iter().map(|c| c.to_string()))
        .collect()
}

/// True when `address` hits an override and `formatted` is one of the
/// addresses that override expects (prefix match, ASCII case-insensitive).
pub fn is_expected_formatted(address: &str, formatted: &str) -> bool {
    let formatted = formatted.trim().to_ascii_lowercase();
    matching_overrides(address).any(|o| {
        o.expected_formatted
            .iter()
            .any(|e| formatted.starts_with(&e.to_ascii_lowercase()))
    })
}
