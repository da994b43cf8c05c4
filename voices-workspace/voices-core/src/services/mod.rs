// src/services/mod.rs

pub mod analytics;
pub mod audit;
pub mod categorization;
pub mod gamification;
pub mod leaderboard;
pub mod remote;       // shared reqwest plumbing for the remote strategies
pub mod resolver;     // ordered fallback chains
pub mod store;        // the ONLY SQLite writer
pub mod transcription;
pub mod translation;

// Public API
pub use audit::Logbook;
pub use categorization::Categorizer;
pub use resolver::{Resolution, Strategy, StrategyError};
pub use store::{RecordStore, SqliteStore};
pub use translation::Translator;
