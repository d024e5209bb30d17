//! Locality and postal-district tables.
//!
//! An area code here is a UK postcode district (`SE1`, `EC1A`, `NW10`). Each
//! locality owns a set of district ranges; a token is only treated as an area
//! code if it falls inside one of them, which keeps arbitrary short
//! alphanumeric tokens (`A1`, `B2B`) from being mistaken for postcodes.

use std::sync::LazyLock;

use regex::Regex;

/// A named locality and the postal districts that belong to it.
#[derive(Debug)]
pub struct Locality {
    pub name: &'static str,
    /// `(prefix, first, last)` district number ranges.
    districts: &'static [(&'static str, u8, u8)],
    /// Short list of likely districts, tried when an address names the
    /// locality but carries no area code.
    pub plausible_area_codes: &'static [&'static str],
}

impl Locality {
    fn owns(&self, prefix: &str, number: u8) -> bool {
        self.districts
            .iter()
            .any(|(p, first, last)| *p == prefix && (*first..=*last).contains(&number))
    }
}

pub static LOCALITIES: &[Locality] = &[Locality {
    name: "London",
    districts: &[
        ("E", 1, 20),
        ("EC", 1, 4),
        ("N", 1, 22),
        ("NW", 1, 11),
        ("SE", 1, 28),
        ("SW", 1, 20),
        ("W", 1, 14),
        ("WC", 1, 2),
    ],
    plausible_area_codes: &["SE1", "EC1", "WC2", "W1", "SW1"],
}];

static AREA_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(EC|WC|NW|SE|SW|E|N|W)(\d{1,2})([A-Z])?$").expect("valid area code regex")
});

static LOCALITY_NAME_RES: LazyLock<Vec<(Regex, &'static Locality)>> = LazyLock::new(|| {
    LOCALITIES
        .iter()
        .map(|loc| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(loc.name)))
                .expect("valid locality regex");
            (re, loc)
        })
        .collect()
});

/// Locality owning `code`, if `code` is a recognized area code.
pub fn locality_for_area_code(code: &str) -> Option<&'static Locality> {
    let caps = AREA_CODE_RE.captures(code)?;
    let prefix = caps[1].to_uppercase();
    let number: u8 = caps[2].parse().ok()?;
    // Sub-district letters only follow single-digit districts (EC1A, W1T).
    if caps.get(3).is_some() && number > 9 {
        return None;
    }
    LOCALITIES.iter().find(|loc| loc.owns(&prefix, number))
}

pub fn is_known_area_code(code: &str) -> bool {
    locality_for_area_code(code).is_some()
}

/// First recognized area code token in `text`, uppercased.
pub fn find_area_code(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .find(|token| is_known_area_code(token))
        .map(str::to_uppercase)
}

/// Locality whose name appears in `text` as a whole word.
pub fn mentioned_locality(text: &str) -> Option<&'static Locality> {
    LOCALITY_NAME_RES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, loc)| *loc)
}

/// Locality implied by an area code in `text` that `text` does not name.
pub fn missing_locality(text: &str) -> Option<&'static Locality> {
    if mentioned_locality(text).is_some() {
        return None;
    }
    find_area_code(text).and_then(|code| locality_for_area_code(&code))
}

/// Append the locality name when `address` carries one of its area codes
/// but does not name it. Returns `address` unchanged otherwise.
pub fn enhance_with_locality(address: &str) -> String {
    match missing_locality(address) {
        Some(loc) => format!("{address}, {}", loc.name),
        None => address.to_string(),
    }
}
