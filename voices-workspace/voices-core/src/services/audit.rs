//! services/audit.rs
//! JSONL logbook: user actions and fallback-chain resolutions.
//!
//! - Writes `actions.jsonl` and `resolutions.jsonl` under `<root>/logbook/`.
//! - Never fails the caller; write errors are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::services::resolver::Attempt;

/// A normalized record of one fallback-chain run, suitable for JSONL logging.
///
/// # Fields
/// - `timestamp`: When the chain finished.
/// - `task`: `"translation"` or `"categorization"`.
/// - `input_preview`: Redacted preview of the resolved input.
/// - `winner`: Name of the strategy whose result was accepted, if any.
/// - `attempts`: Every strategy tried, in order, with its outcome and latency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub timestamp: DateTime<Utc>,
    pub task: String,
    pub input_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone)]
pub struct Logbook {
    enabled: bool,
    actions: PathBuf,
    resolutions: PathBuf,
    preview_len: usize,
}

impl Logbook {
    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self {
            enabled: cfg.services.audit_enabled,
            actions: cfg.logbook.actions_path(),
            resolutions: cfg.logbook.resolutions_path(),
            preview_len: cfg.logbook.preview_len,
        }
    }

    /// A logbook that records nothing (tests, embedded callers).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            actions: PathBuf::new(),
            resolutions: PathBuf::new(),
            preview_len: 0,
        }
    }

    pub fn actions_path(&self) -> &Path {
        &self.actions
    }

    pub fn resolutions_path(&self) -> &Path {
        &self.resolutions
    }

    /// Record a user-facing action.
    ///
    /// # Arguments
    /// * `agent`: Component label (e.g., `"commands"`).
    /// * `action`: Short verb label (e.g., `"submit"`, `"like"`).
    /// * `details`: Arbitrary JSON payload (ids, counts).
    /// * `severity`: `"low" | "medium" | "high"`.
    pub fn record_action(&self, agent: &str, action: &str, details: &Value, severity: &str) {
        if !self.enabled {
            return;
        }
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": "action",
            "agent": agent,
            "action": action,
            "severity": severity,
            "details": details
        });
        append_jsonl(&self.actions, &entry);
    }

    /// Record which strategy resolved a chain and how every attempt went.
    pub fn record_resolution(
        &self,
        task: &str,
        input: &str,
        winner: Option<&str>,
        attempts: &[Attempt],
    ) {
        if !self.enabled {
            return;
        }
        let rec = ResolutionRecord {
            timestamp: Utc::now(),
            task: task.to_string(),
            input_preview: self.redact_preview(input),
            winner: winner.map(str::to_string),
            attempts: attempts.to_vec(),
        };
        append_jsonl(&self.resolutions, &rec);
    }

    /// Single-line preview truncated to `preview_len` characters.
    fn redact_preview(&self, s: &str) -> String {
        let flat = s.replace('\n', " ");
        if flat.chars().count() <= self.preview_len {
            return flat;
        }
        let mut t: String = flat.chars().take(self.preview_len).collect();
        t.push('…');
        t
    }
}

/// Append one JSON value as a line. Creates parent directories; ignores write errors.
fn append_jsonl<S: Serialize>(path: &Path, val: &S) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(line) = serde_json::to_string(val) else {
        return;
    };
    if let Ok(mut f) = fs::OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(f, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolver::Outcome;

    fn logbook_in(dir: &Path) -> Logbook {
        let mut cfg = CoreConfig::default();
        cfg.logbook.dir = dir.join("logbook");
        cfg.logbook.preview_len = 8;
        Logbook::from_config(&cfg)
    }

    #[test]
    fn actions_append_one_line_each() {
        let dir = tempfile::tempdir().unwrap();
        let log = logbook_in(dir.path());
        log.record_action("commands", "like", &json!({"id": "a"}), "low");
        log.record_action("commands", "share", &json!({"id": "a"}), "low");
        let text = fs::read_to_string(log.actions_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        let first: Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["action"], "like");
    }

    #[test]
    fn resolution_preview_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let log = logbook_in(dir.path());
        let attempts = vec![Attempt {
            strategy: "google".into(),
            outcome: Outcome::Accepted,
            latency_ms: 1.0,
            detail: None,
        }];
        log.record_resolution("translation", "a long line\nof text", Some("google"), &attempts);
        let text = fs::read_to_string(log.resolutions_path()).unwrap();
        let rec: ResolutionRecord = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(rec.input_preview, "a long l…");
        assert_eq!(rec.winner.as_deref(), Some("google"));
    }

    #[test]
    fn disabled_logbook_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = CoreConfig::default();
        cfg.logbook.dir = dir.path().join("logbook");
        cfg.services.audit_enabled = false;
        let log = Logbook::from_config(&cfg);
        log.record_action("commands", "like", &json!({}), "low");
        assert!(!log.actions_path().exists());
    }
}
