// src/commands/mod.rs
pub mod init;
pub mod session;
pub mod validate;
mod api;

pub use api::{CategorySuggestion, Commands, SubmitReceipt, VOICE_RECORDING_MARKER};
pub use init::{InitReport, ensure_initialized, ensure_initialized_at};
pub use session::{Notice, Session};
pub use validate::{SubmissionDraft, SubmitError, SubmitOptions, ValidationError};
