//! Rule-based shortcuts consulted only after keyword scoring finds nothing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{fold, word_count};
use crate::types::{Category, ContentType};

/// Content shorter than this many words reads as a saying.
pub const SHORT_CONTENT_WORDS: usize = 20;

static WHO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(he who|she who|those who)\b").expect("static pattern"));
static LOVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(love|heart|beloved)\b").expect("static pattern"));
static FAMILY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(mother|father|family|child)\b").expect("static pattern"));

const PROVERB_CUES: &[&str] = &["wise", "fool", "learn", "teach"];
const FOLK_TALE_CUES: &[&str] = &["once upon", "long ago", "ancient"];

/// Apply content-type and pattern rules in order; first hit wins.
pub fn categorize_by_rules(content: &str, content_type: Option<ContentType>) -> Option<Category> {
    let folded = fold(content);

    match content_type {
        Some(ContentType::Proverb) => {
            if PROVERB_CUES.iter().any(|w| folded.contains(w)) {
                return Some(Category::Wisdom);
            }
        }
        Some(ContentType::FolkTale) => {
            if FOLK_TALE_CUES.iter().any(|w| folded.contains(w)) {
                return Some(Category::Tradition);
            }
        }
        Some(ContentType::ChildrensTale) => return Some(Category::ChildrensTales),
        _ => {}
    }

    if word_count(content) < SHORT_CONTENT_WORDS {
        return Some(Category::Wisdom);
    }
    if WHO_PATTERN.is_match(&folded) {
        return Some(Category::Wisdom);
    }
    if LOVE_PATTERN.is_match(&folded) {
        return Some(Category::Love);
    }
    if FAMILY_PATTERN.is_match(&folded) {
        return Some(Category::Family);
    }
    None
}
