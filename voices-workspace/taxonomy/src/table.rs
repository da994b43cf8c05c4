//! Parsed, validated keyword tables (one entry per category).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::assets::KEYWORDS_TOML;
use crate::types::Category;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("parsing keyword table: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("keyword table names unknown category {0:?}")]
    UnknownCategory(String),
    #[error("keyword table lists {0} more than once")]
    Duplicate(Category),
    #[error("keyword table has no entry for {0}")]
    Missing(Category),
    #[error("compiling boundary pattern for {keyword:?}: {source}")]
    Pattern {
        keyword: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "category")]
    categories: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    label: String,
    keywords: Vec<String>,
    #[serde(default)]
    confidence: Vec<String>,
}

/// One scoring keyword plus its precompiled whole-word matcher.
#[derive(Debug, Clone)]
pub struct Keyword {
    pub text: String,
    pub(crate) boundary: Regex,
}

#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<Keyword>,
    pub confidence: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordTable {
    pub name: String,
    pub version: String,
    /// Always in `Category::ALL` order.
    entries: Vec<CategoryKeywords>,
}

static EMBEDDED: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::parse(KEYWORDS_TOML).expect("embedded keyword table is valid")
});

impl KeywordTable {
    /// The table shipped inside the crate.
    pub fn embedded() -> &'static KeywordTable {
        &EMBEDDED
    }

    /// Parse and validate a TOML keyword table. Every category must appear
    /// exactly once; keywords are folded to lowercase.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let raw: RawTable = toml::from_str(text)?;
        let mut slots: Vec<Option<CategoryKeywords>> = vec![None; Category::ALL.len()];

        for entry in raw.categories {
            let category = Category::from_label(&entry.label)
                .ok_or_else(|| TableError::UnknownCategory(entry.label.clone()))?;
            let idx = index_of(category);
            if slots[idx].is_some() {
                return Err(TableError::Duplicate(category));
            }

            let mut keywords = Vec::with_capacity(entry.keywords.len());
            for kw in entry.keywords {
                let text = kw.trim().to_lowercase();
                if text.is_empty() {
                    continue;
                }
                let pattern = format!(r"\b{}\b", regex::escape(&text));
                let boundary = Regex::new(&pattern).map_err(|source| TableError::Pattern {
                    keyword: text.clone(),
                    source,
                })?;
                keywords.push(Keyword { text, boundary });
            }

            let confidence = entry
                .confidence
                .into_iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect();

            slots[idx] = Some(CategoryKeywords { category, keywords, confidence });
        }

        let mut entries = Vec::with_capacity(slots.len());
        for (slot, category) in slots.into_iter().zip(Category::ALL) {
            entries.push(slot.ok_or(TableError::Missing(category))?);
        }

        Ok(Self {
            name: raw.name.unwrap_or_else(|| "categories".to_string()),
            version: raw.version.unwrap_or_else(|| "0.0.0".to_string()),
            entries,
        })
    }

    pub fn entries(&self) -> &[CategoryKeywords] {
        &self.entries
    }

    pub fn entry(&self, category: Category) -> &CategoryKeywords {
        &self.entries[index_of(category)]
    }
}

fn index_of(category: Category) -> usize {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_covers_every_category_in_order() {
        let table = KeywordTable::embedded();
        let order: Vec<Category> = table.entries().iter().map(|e| e.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        for e in table.entries() {
            assert!(e.keywords.len() >= 15, "{} has too few keywords", e.category);
            assert_eq!(e.confidence.len(), 5);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = KeywordTable::parse(
            r#"
            [[category]]
            label = "Cooking"
            keywords = ["rice"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::UnknownCategory(_)));
    }

    #[test]
    fn partial_table_reports_missing_category() {
        let err = KeywordTable::parse(
            r#"
            [[category]]
            label = "Humor & Wit"
            keywords = ["joke"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::Missing(Category::Wisdom)));
    }
}
