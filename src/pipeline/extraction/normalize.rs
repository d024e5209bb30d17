/// Normalize OCR text before any pattern matching.
/// Line breaks and whitespace runs collapse to one space, characters outside
/// letters, digits, whitespace and `, . ' -` are dropped, ends are trimmed.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_allowed(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || matches!(c, ',' | '.' | '\'' | '-')
}

/// Split raw text into trimmed, non-empty lines with control characters removed.
/// Unlike [`normalize`] this keeps `@ : / +` and friends, which contact
/// details need.
pub fn clean_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_control() || *c == '\t')
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|l| !l.is_empty())
        .collect()
}
