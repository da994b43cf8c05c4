// src/commands/session.rs
//! Per-interaction context: who is acting, which badges they already hold,
//! and what the front end should tell them afterwards.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::services::gamification::{BadgeDefinition, BadgeKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A non-fatal problem (translation unavailable, low transcription confidence, ..).
    Warning { message: String },
    BadgeEarned { key: BadgeKey, name: String, icon: String },
}

#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    held: BTreeSet<BadgeKey>,
    notices: Vec<Notice>,
}

impl Session {
    /// A session with no held badges. `Commands::open_session` seeds them from the store.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            held: BTreeSet::new(),
            notices: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn held_badges(&self) -> &BTreeSet<BadgeKey> {
        &self.held
    }

    pub fn holds(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    pub(crate) fn set_held(&mut self, held: BTreeSet<BadgeKey>) {
        self.held = held;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(user = %self.user_id, %message, "session warning");
        self.notices.push(Notice::Warning { message });
    }

    pub(crate) fn badge_earned(&mut self, badge: &BadgeDefinition) {
        self.held.insert(badge.key.clone());
        self.notices.push(Notice::BadgeEarned {
            key: badge.key.clone(),
            name: badge.name.clone(),
            icon: badge.icon.clone(),
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain notices once they have been shown.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
