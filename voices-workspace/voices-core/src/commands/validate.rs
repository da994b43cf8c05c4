// src/commands/validate.rs
//! Submission drafts and the checks that run before anything is written.

use serde::{Deserialize, Serialize};
use taxonomy::{Category, ContentType, Language};

use crate::config::ContentConfig;
use crate::services::transcription::TranscriptionError;

/// User-supplied fields, before translation and categorization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub title: String,
    pub content: String,
    pub content_type: Option<ContentType>,
    pub language: Option<Language>,
    #[serde(default)]
    pub dialect: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cultural_context: Option<String>,
    /// A translation supplied by the submitter; skips machine translation.
    #[serde(default)]
    pub english_translation: Option<String>,
    /// A category chosen by the submitter; skips auto-categorization.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    pub auto_translate: bool,
    pub auto_categorize: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            auto_translate: true,
            auto_categorize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    Missing(&'static str),
    #[error("{field} is too long ({actual} > {max} characters)")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("audio rejected: {0}")]
    Audio(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Shown to the submitter; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Fields that must be present and within limits. Returns the first problem found.
pub fn validate_draft(draft: &SubmissionDraft, limits: &ContentConfig) -> Result<(), ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::Missing("title"));
    }
    if draft.content.trim().is_empty() {
        return Err(ValidationError::Missing("content"));
    }
    if draft.content_type.is_none() {
        return Err(ValidationError::Missing("content type"));
    }
    if draft.language.is_none() {
        return Err(ValidationError::Missing("language"));
    }
    let title_len = draft.title.trim().chars().count();
    if title_len > limits.max_title_len {
        return Err(ValidationError::TooLong {
            field: "title",
            max: limits.max_title_len,
            actual: title_len,
        });
    }
    let content_len = draft.content.trim().chars().count();
    if content_len > limits.max_text_len {
        return Err(ValidationError::TooLong {
            field: "content",
            max: limits.max_text_len,
            actual: content_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SubmissionDraft {
        SubmissionDraft {
            title: "Water".into(),
            content: "Jal hi jeevan hai".into(),
            content_type: Some(ContentType::Proverb),
            language: Some(Language::Hindi),
            ..SubmissionDraft::default()
        }
    }

    #[test]
    fn complete_draft_passes() {
        assert_eq!(validate_draft(&draft(), &ContentConfig::default()), Ok(()));
    }

    #[test]
    fn blank_title_is_missing() {
        let d = SubmissionDraft {
            title: "   ".into(),
            ..draft()
        };
        assert_eq!(validate_draft(&d, &ContentConfig::default()), Err(ValidationError::Missing("title")));
    }

    #[test]
    fn language_is_required() {
        let d = SubmissionDraft {
            language: None,
            ..draft()
        };
        assert_eq!(validate_draft(&d, &ContentConfig::default()), Err(ValidationError::Missing("language")));
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let limits = ContentConfig {
            max_title_len: 5,
            ..ContentConfig::default()
        };
        // five Devanagari characters, fifteen bytes
        let d = SubmissionDraft {
            title: "पानीपान".chars().take(5).collect(),
            ..draft()
        };
        assert_eq!(validate_draft(&d, &limits), Ok(()));
        let long = SubmissionDraft {
            title: "abcdef".into(),
            ..draft()
        };
        assert!(matches!(
            validate_draft(&long, &limits),
            Err(ValidationError::TooLong { field: "title", max: 5, actual: 6 })
        ));
    }
}
