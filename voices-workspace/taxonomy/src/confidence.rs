use crate::normalize::{fold, word_count};
use crate::table::KeywordTable;
use crate::types::Category;

/// Confidence reported for a label the table does not know.
pub const UNKNOWN_LABEL_CONFIDENCE: f32 = 0.5;
/// Alternatives at or below this confidence are not suggested.
pub const ALTERNATIVE_MIN_CONFIDENCE: f32 = 0.1;
pub const MAX_ALTERNATIVES: usize = 3;

/// Estimate how well `category` fits `content`.
///
/// `keyword_density * 0.7 + min(words / 50, 1) * 0.3`, clipped to `[0, 1]`,
/// where density is the share of the category's confidence keywords that
/// occur anywhere in the text.
pub fn category_confidence(content: &str, category: Category, table: &KeywordTable) -> f32 {
    if content.trim().is_empty() {
        return 0.0;
    }
    let keywords = &table.entry(category).confidence;
    if keywords.is_empty() {
        return UNKNOWN_LABEL_CONFIDENCE;
    }

    let folded = fold(content);
    let matches = keywords.iter().filter(|k| folded.contains(k.as_str())).count();
    let density = matches as f32 / keywords.len() as f32;
    let length_factor = (word_count(content) as f32 / 50.0).min(1.0);

    (density * 0.7 + length_factor * 0.3).clamp(0.0, 1.0)
}

/// Same as [`category_confidence`] for a free-form label; unknown labels get
/// [`UNKNOWN_LABEL_CONFIDENCE`].
pub fn label_confidence(content: &str, label: &str, table: &KeywordTable) -> f32 {
    if content.trim().is_empty() || label.trim().is_empty() {
        return 0.0;
    }
    match Category::from_label(label) {
        Some(c) => category_confidence(content, c, table),
        None => UNKNOWN_LABEL_CONFIDENCE,
    }
}

/// Up to three other categories, best first, that clear the confidence floor.
pub fn suggest_alternatives(content: &str, current: Category, table: &KeywordTable) -> Vec<Category> {
    let mut scored: Vec<(Category, f32)> = Category::ALL
        .iter()
        .copied()
        .filter(|c| *c != current)
        .map(|c| (c, category_confidence(content, c, table)))
        .collect();
    // Stable sort keeps enumeration order among equal confidences.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .filter(|(_, conf)| *conf > ALTERNATIVE_MIN_CONFIDENCE)
        .map(|(c, _)| c)
        .collect()
}
