//! Voices-Core: the submission store, translation and categorization
//! fallback chains, and the badge/streak engine behind Bharat Voices.

pub mod commands;
pub mod config;
pub mod services;

pub use commands::{Commands, Notice, Session, SubmissionDraft, SubmitError, SubmitOptions};
pub use config::CoreConfig;
pub use taxonomy::{Category, ContentType, Language};
