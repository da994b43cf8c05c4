//! Text folding used by keyword scoring, rule heuristics and search.
//!
//! Policy:
//! - Control characters (newlines, tabs) fold to a single space so word
//!   boundaries survive.
//! - Common zero-width characters (ZWS/ZWNJ/ZWJ/WJ/BOM) are dropped.
//! - Unicode-aware lowercasing (char.to_lowercase()).
//!
//! Keep this single-sourced so the scorer, the rules and store search agree.

/// Fold text for keyword matching and case-insensitive search.
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_control() {
            out.push(' ');
            continue;
        }
        for lc in ch.to_lowercase() {
            match lc {
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => {}
                _ => out.push(lc),
            }
        }
    }
    out
}

/// Whitespace-delimited word count of the raw text.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}
