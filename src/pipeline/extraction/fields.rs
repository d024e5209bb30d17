//! Best-effort field extraction from OCR text.
//!
//! Address, postcode and business-name patterns run against normalized and
//! OCR-corrected text. Phone, website and email run against the raw lines
//! with only control characters removed, since normalization drops `@`, `:`
//! and `/`. Each category takes its first match and never blocks the others.

use std::sync::LazyLock;

use regex::Regex;

use super::gazetteer::{enhance_with_locality, find_area_code, mentioned_locality};
use super::normalize::{clean_lines, normalize};
use super::ocr_correction::correct_ocr_errors;
use super::types::ExtractedFields;

const STREET_SUFFIXES: &str = r"Street|St|Road|Rd|Avenue|Ave|Lane|Ln|Way|Drive|Dr|Place|Pl|Square|Sq|Terrace|Tce|Crescent|Cres|Close|Gardens|Gdns|Grove|Hill|Row|Walk|Mews|Parade|Yard|Green|Gate|Embankment|Broadway|Circus";

/// Suffixes safe to match without a leading street number.
const STREET_SUFFIXES_FULL_WORD: &str = r"Street|Road|Avenue|Lane|Place|Square|Terrace|Crescent|Gardens|Grove|Mews|Parade|Walk|Embankment|Broadway|Circus";

const BUILDING_SUFFIXES: &str = r"Court|House|Buildings|Building|Mansions|Tower|Towers|Chambers|Centre|Works|Wharf|Lodge|Studios|Estate";

const BUSINESS_CATEGORIES: &str = r"Cafe|Café|Coffee|Restaurant|Bar|Pub|Hotel|Bakery|Salon|Studio|Shop|Store|Gallery|Pharmacy|Clinic|Dental|Market|Kitchen|Bistro|Deli|Books|Bookshop|Barbers|Gym|Theatre|Cinema|Museum|Florist|Surgery|Garage|Ltd|Limited|LLP|Inc|Group";

/// Capitalized name words, one to `n` of them, each followed by whitespace.
fn name_words(max: u8) -> String {
    format!(r"(?:[A-Z][\w'&-]*\.?\s+){{1,{max}}}")
}

/// Street-address patterns, most specific first. First match wins.
static ADDRESS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let number = r"\d+[A-Za-z]?(?:-\d+[A-Za-z]?)?,?\s+";
    vec![
        // 221B Baker Street / 12-14 Old Kent Rd
        Regex::new(&format!(
            r"\b({number}{}(?i:{STREET_SUFFIXES})\b\.?)",
            name_words(4)
        )),
        // Baker Street
        Regex::new(&format!(
            r"\b({}(?i:{STREET_SUFFIXES_FULL_WORD})\b)",
            name_words(3)
        )),
        // 19 Peace Court / 4 Bridge House
        Regex::new(&format!(
            r"\b({number}{}(?i:{BUILDING_SUFFIXES})\b)",
            name_words(3)
        )),
    ]
    .into_iter()
    .map(|re| re.expect("valid address regex"))
    .collect()
});

static FULL_POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{1,2}\d[A-Z\d]?)\s*(\d[A-Z]{2})\b").expect("valid postcode regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid email regex")
});

static WEBSITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://)?(?:www\.)?[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.(?:com|co\.uk|org\.uk|org|net|uk|io|london|biz|info)\b(?:/\S*)?",
    )
    .expect("valid website regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+44\s?(?:\(0\)\s?)?\d{2,4}|\(?\b0\d{2,4}\)?)[\s-]?\d{3,4}[\s-]?\d{3,4}")
        .expect("valid phone regex")
});

static BUSINESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b((?:[A-Z][\w'&-]*\s+){{0,3}}[A-Z][\w'&-]*\s+(?i:{BUSINESS_CATEGORIES}))\b"
    ))
    .expect("valid business regex")
});

/// Extract all fields from raw OCR text. Never fails; missing fields are empty.
pub fn extract_fields(raw: &str) -> ExtractedFields {
    let lines = clean_lines(raw);
    let contact_text = lines.join("\n");
    let corrected = correct_ocr_errors(&normalize(raw));

    let email = first_match(&EMAIL_RE, &contact_text);
    let website = first_match(&WEBSITE_RE, &EMAIL_RE.replace_all(&contact_text, " "));
    let phone_number = first_match(&PHONE_RE, &contact_text);
    let postcode = extract_postcode(&corrected);
    let street = extract_street(&corrected).unwrap_or_default();
    let address = compose_address(&street, &postcode, &corrected);

    let mut fields = ExtractedFields {
        business_name: String::new(),
        address,
        postcode,
        phone_number,
        website,
        email,
    };
    fields.business_name = extract_business_name(&lines, &street, &fields);

    tracing::debug!(
        text_len = raw.len(),
        has_address = !fields.address.is_empty(),
        has_postcode = !fields.postcode.is_empty(),
        has_phone = !fields.phone_number.is_empty(),
        has_email = !fields.email.is_empty(),
        has_website = !fields.website.is_empty(),
        has_business = !fields.business_name.is_empty(),
        "Fields extracted"
    );

    fields
}

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Strict full postcode first, then an allow-listed area code.
pub fn extract_postcode(text: &str) -> String {
    if let Some(caps) = FULL_POSTCODE_RE.captures(text) {
        return format!("{} {}", &caps[1], &caps[2]);
    }
    find_area_code(text).unwrap_or_default()
}

/// Street part of an address, from the first pattern that matches.
pub fn extract_street(text: &str) -> Option<String> {
    ADDRESS_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(',').to_string())
    })
}

/// Street + locality named in the text + postcode, then locality enhancement.
fn compose_address(street: &str, postcode: &str, text: &str) -> String {
    if street.is_empty() {
        return String::new();
    }
    let mut address = street.to_string();
    if let Some(loc) = mentioned_locality(text) {
        if mentioned_locality(street).is_none() {
            address.push_str(", ");
            address.push_str(loc.name);
        }
    }
    if !postcode.is_empty() && !address.contains(postcode) {
        address.push(' ');
        address.push_str(postcode);
    }
    enhance_with_locality(&address)
}

/// Category pattern per line first, else the first line that is not already
/// accounted for by another field.
fn extract_business_name(lines: &[String], street: &str, fields: &ExtractedFields) -> String {
    let normalized: Vec<String> = lines.iter().map(|l| normalize(l)).collect();

    for line in &normalized {
        let corrected = correct_ocr_errors(line);
        if !street.is_empty() && corrected.contains(street) {
            continue;
        }
        if let Some(m) = BUSINESS_RE.captures(&corrected).and_then(|c| c.get(1)) {
            return m.as_str().trim().to_string();
        }
    }

    let taken = fields.values();
    lines
        .iter()
        .zip(&normalized)
        .find(|(raw, line)| {
            line.chars().count() > 2
                && !taken.iter().any(|v| !v.is_empty() && (*v == line.as_str() || raw.contains(*v)))
                && (street.is_empty() || !correct_ocr_errors(line).contains(street))
        })
        .map(|(_, line)| line.clone())
        .unwrap_or_default()
}
