//! Post-OCR correction for address text.
//!
//! Runs three passes in a fixed order:
//! 1. Letter → digit: `O`, `l` and `I` touching a digit become `0`, `1`, `1`.
//!    The reverse direction (digit → letter) is never applied here.
//! 2. Known garbled postcode fragments are replaced, whole tokens only.
//! 3. Near-miss street vocabulary (`Streel`, `Avenve`) is snapped to the
//!    canonical word when the match is unambiguous.

use std::sync::LazyLock;

use regex::Regex;

/// Garbled fragment → corrected area code. Fragments contain no digits, so a
/// corrected value can never be matched again by a later run.
/// Longer fragments come first so `SEISTR` wins over `SEI`.
const POSTCODE_FRAGMENTS: &[(&str, &str)] = &[
    ("SEISTR", "SE1"),
    ("SWIA", "SW1A"),
    ("ECIA", "EC1A"),
    ("ECIV", "EC1V"),
    ("WCIE", "WC1E"),
    ("WCIN", "WC1N"),
    ("SEI", "SE1"),
    ("SEl", "SE1"),
    ("SWI", "SW1"),
    ("SWl", "SW1"),
    ("ECI", "EC1"),
    ("WCI", "WC1"),
    ("NWI", "NW1"),
    ("Wl", "W1"),
];

/// Street vocabulary for near-miss correction. Sorted for binary search.
const STREET_TERMS: &[&str] = &[
    "avenue", "building", "crescent", "gardens", "mansions", "parade", "street", "terrace",
];

static FRAGMENT_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    POSTCODE_FRAGMENTS
        .iter()
        .map(|(garbled, fixed)| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(garbled)))
                .expect("valid fragment regex");
            (re, *fixed)
        })
        .collect()
});

/// Apply all correction passes to normalized text.
pub fn correct_ocr_errors(text: &str) -> String {
    let digits_fixed = fix_letters_beside_digits(text);
    let fragments_fixed = fix_postcode_fragments(&digits_fixed);
    fix_street_vocabulary(&fragments_fixed)
}

// ═══════════════════════════════════════════════════════════
// Pass 1: letter → digit by adjacency
// ═══════════════════════════════════════════════════════════

fn digit_lookalike(c: char) -> Option<char> {
    match c {
        'O' => Some('0'),
        'l' | 'I' => Some('1'),
        _ => None,
    }
}

/// Rewrite digit-like letters that touch a digit. A whole run of look-alikes
/// converts when either end touches a digit, so `OO1` becomes `001`. One
/// forward and one backward scan, linear in the input length.
fn fix_letters_beside_digits(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();

    let mut prev_is_digit = false;
    for c in chars.iter_mut() {
        if prev_is_digit {
            if let Some(digit) = digit_lookalike(*c) {
                *c = digit;
            }
        }
        prev_is_digit = c.is_ascii_digit();
    }

    let mut next_is_digit = false;
    for c in chars.iter_mut().rev() {
        if next_is_digit {
            if let Some(digit) = digit_lookalike(*c) {
                *c = digit;
            }
        }
        next_is_digit = c.is_ascii_digit();
    }

    chars.into_iter().collect()
}

// ═══════════════════════════════════════════════════════════
// Pass 2: known postcode fragments
// ═══════════════════════════════════════════════════════════

fn fix_postcode_fragments(text: &str) -> String {
    let mut out = text.to_string();
    for (re, fixed) in FRAGMENT_RES.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *fixed).into_owned();
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════
// Pass 3: street vocabulary
// ═══════════════════════════════════════════════════════════

fn fix_street_vocabulary(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut word_buf = String::new();

    for ch in text.chars() {
        if ch.is_alphabetic() {
            word_buf.push(ch);
        } else {
            if !word_buf.is_empty() {
                result.push_str(&try_correct_word(&word_buf));
                word_buf.clear();
            }
            result.push(ch);
        }
    }

    if !word_buf.is_empty() {
        result.push_str(&try_correct_word(&word_buf));
    }

    result
}

/// Only corrects if: word has >= 6 letters, edit distance is exactly 1,
/// the match is unique, and the word is not an inflected form of the term
/// (`Gardens`/`Garden`, `Terraced`).
fn try_correct_word(word: &str) -> String {
    if word.chars().count() < 6 {
        return word.to_string();
    }

    let lower = word.to_lowercase();
    if STREET_TERMS.binary_search(&lower.as_str()).is_ok() {
        return word.to_string();
    }

    let mut best_term: Option<&str> = None;
    let mut ambiguous = false;

    for &term in STREET_TERMS {
        if is_inflection_of(&lower, term) {
            return word.to_string();
        }
        let len_diff = (lower.chars().count() as i32 - term.len() as i32).unsigned_abs();
        if len_diff > 1 {
            continue;
        }
        if edit_distance(&lower, term) == 1 {
            if best_term.is_some() {
                ambiguous = true;
            }
            best_term = Some(term);
        }
    }

    match best_term {
        Some(term) if !ambiguous => preserve_case(word, term),
        _ => word.to_string(),
    }
}

fn is_inflection_of(word: &str, term: &str) -> bool {
    word.strip_suffix(['s', 'd']) == Some(term) || term.strip_suffix('s') == Some(word)
}

/// Preserve the original word's capitalization pattern when applying correction.
fn preserve_case(original: &str, correction: &str) -> String {
    if original.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) {
        return correction.to_uppercase();
    }

    let first_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    if first_upper {
        let mut chars = correction.chars();
        match chars.next() {
            Some(c) => {
                let mut s = c.to_uppercase().to_string();
                s.extend(chars);
                s
            }
            None => correction.to_string(),
        }
    } else {
        correction.to_string()
    }
}

/// Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> u32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 { return n as u32; }
    if n == 0 { return m as u32; }

    let mut prev: Vec<u32> = (0..=n as u32).collect();
    let mut curr = vec![0u32; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = if a_ch == b_ch { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
