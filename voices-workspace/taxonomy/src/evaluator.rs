use serde::Serialize;

use crate::normalize::fold;
use crate::table::{CategoryKeywords, KeywordTable};
use crate::types::Category;

/// Points added when a keyword also appears as a whole word.
pub const WHOLE_WORD_BONUS: u32 = 2;

// ----------------- Result -----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: u32,
}

// ----------------- Core -----------------

/// Score one category against already-folded text.
///
/// Each keyword contributes its raw (non-overlapping) substring count, plus
/// [`WHOLE_WORD_BONUS`] once if it also matches on word boundaries.
fn score_entry(entry: &CategoryKeywords, folded: &str) -> u32 {
    let mut score = 0u32;
    for kw in &entry.keywords {
        score += folded.matches(kw.text.as_str()).count() as u32;
        if kw.boundary.is_match(folded) {
            score += WHOLE_WORD_BONUS;
        }
    }
    score
}

/// Scores for every category, in `Category::ALL` order.
pub fn score_categories(text: &str, table: &KeywordTable) -> Vec<CategoryScore> {
    let folded = fold(text);
    table
        .entries()
        .iter()
        .map(|e| CategoryScore { category: e.category, score: score_entry(e, &folded) })
        .collect()
}

/// Highest-scoring category, or `None` when nothing matched at all.
///
/// Ties go to the category that comes first in enumeration order.
pub fn best_by_keywords(text: &str, table: &KeywordTable) -> Option<CategoryScore> {
    let mut best: Option<CategoryScore> = None;
    for s in score_categories(text, table) {
        match best {
            Some(b) if s.score <= b.score => {}
            _ => best = Some(s),
        }
    }
    best.filter(|b| b.score > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static KeywordTable {
        KeywordTable::embedded()
    }

    #[test]
    fn whole_word_adds_bonus_on_top_of_count() {
        let scores = score_categories("love", table());
        let love = scores.iter().find(|s| s.category == Category::Love).unwrap();
        // "love" substring (1) + whole word (2)
        assert_eq!(love.score, 3);
    }

    #[test]
    fn substring_inside_longer_word_gets_no_bonus() {
        let scores = score_categories("lovely", table());
        let love = scores.iter().find(|s| s.category == Category::Love).unwrap();
        assert_eq!(love.score, 1);
    }

    #[test]
    fn ties_resolve_to_first_category() {
        // "old" is in both Tradition and Historical with equal weight.
        let best = best_by_keywords("old", table()).unwrap();
        assert_eq!(best.category, Category::Tradition);
    }

    #[test]
    fn nothing_matched_yields_none() {
        assert!(best_by_keywords("zzz qqq", table()).is_none());
    }
}
