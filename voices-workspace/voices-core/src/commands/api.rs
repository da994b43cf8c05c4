// src/commands/api.rs
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use taxonomy::{Category, Language};

use crate::commands::init::ensure_initialized;
use crate::commands::session::Session;
use crate::commands::validate::{SubmissionDraft, SubmitError, SubmitOptions, ValidationError, validate_draft};
use crate::config::CoreConfig;
use crate::services::analytics::{self, Analytics};
use crate::services::audit::Logbook;
use crate::services::categorization::{Categorizer, load_keyword_table};
use crate::services::gamification::{
    self, AchievementProgress, BadgeDefinition, BadgeKey, DailyChallenge, UserStats,
};
use crate::services::leaderboard::{self, LeaderboardEntry, Metric, Rank};
use crate::services::store::{
    FieldUpdate, InteractionType, NewSubmission, RecordStore, SqliteStore, Submission, SubmissionFilter,
    UserProfile,
};
use crate::services::transcription::{AudioInfo, Transcriber, validate_audio};
use crate::services::translation::{TranslationRequest, Translator};

/// Transcripts below this confidence are kept but flagged for review.
const LOW_TRANSCRIPTION_CONFIDENCE: f64 = 0.5;

/// `audio_url` of voice submissions whose recording is not hosted anywhere.
pub const VOICE_RECORDING_MARKER: &str = "voice_recording";

pub struct Commands<S: RecordStore = SqliteStore> {
    config: CoreConfig,
    store: S,                      // the only writer
    translator: Option<Translator>, // None when translation is disabled
    categorizer: Categorizer,
    logbook: Logbook,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub submission: Submission,
    /// Strategy that produced the translation, if one was machine-made.
    pub translated_by: Option<String>,
    pub categorized_by: Option<String>,
    pub new_badges: Vec<BadgeKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySuggestion {
    pub category: Category,
    pub confidence: f32,
}

impl Commands<SqliteStore> {
    /// Open against `config.store.db_path` with the remote chains from `config.remote`.
    pub fn open(config: CoreConfig) -> Result<Self> {
        let logbook = Logbook::from_config(&config);
        let store = SqliteStore::open(&config.store.db_path)?;
        let translator = if config.services.translation_enabled {
            Some(Translator::from_config(&config, logbook.clone())?)
        } else {
            None
        };
        let categorizer = if config.services.categorization_enabled {
            Categorizer::from_config(&config, logbook.clone())?
        } else {
            Categorizer::offline(load_keyword_table(&config), logbook.clone())
        };
        tracing::info!(db = %config.store.db_path.display(), "commands ready");
        Ok(Self::with_parts(config, store, translator, categorizer, logbook))
    }

    /// Initialize the default root (`VOICES_ROOT` or `.voices`) and open it.
    pub fn open_default() -> Result<Self> {
        let report = ensure_initialized()?;
        Self::open(report.config)
    }
}

impl<S: RecordStore> Commands<S> {
    pub fn with_parts(
        config: CoreConfig,
        store: S,
        translator: Option<Translator>,
        categorizer: Categorizer,
        logbook: Logbook,
    ) -> Self {
        Self {
            config,
            store,
            translator,
            categorizer,
            logbook,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn catalog(&self) -> &[BadgeDefinition] {
        &self.config.gamification.badges
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // ---------------- sessions & profiles ----------------

    /// Start a session; badges the user already qualifies for count as held.
    pub fn open_session(&self, user_id: &str) -> Result<Session> {
        let stats = self.raw_stats(user_id)?;
        let mut session = Session::new(user_id);
        session.set_held(gamification::qualifying_badges(&stats, self.catalog()));
        Ok(session)
    }

    pub fn register_profile(&self, profile: &UserProfile) -> Result<()> {
        self.store.upsert_profile(profile)?;
        self.logbook.record_action(
            "commands",
            "profile_saved",
            &json!({ "user_id": profile.user_id }),
            "low",
        );
        Ok(())
    }

    pub fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.store.profile(user_id)
    }

    // ---------------- submissions ----------------

    /// Validate, translate (unless English), categorize, store, then check badges.
    /// Translation and categorization failures never block the write.
    pub fn submit(
        &self,
        session: &mut Session,
        draft: SubmissionDraft,
        options: SubmitOptions,
    ) -> Result<SubmitReceipt, SubmitError> {
        validate_draft(&draft, &self.config.content)?;
        let (Some(content_type), Some(language)) = (draft.content_type, draft.language) else {
            return Err(ValidationError::Missing("content type").into());
        };
        let content = draft.content.trim().to_string();

        let mut translated_by = None;
        let (english_translation, ai_translated) = match draft.english_translation.clone() {
            Some(manual) if !manual.trim().is_empty() => (Some(manual.trim().to_string()), false),
            _ if language == Language::English => (Some(content.clone()), false),
            _ if options.auto_translate => match &self.translator {
                Some(translator) => {
                    let req = TranslationRequest::new(content.clone(), language.code(), "en");
                    let res = translator.translate_detailed(&req);
                    match res.value {
                        Some(text) => {
                            translated_by = res.strategy;
                            (Some(text.trim().to_string()), true)
                        }
                        None => {
                            session.warn("Translation unavailable; the story was saved without an English translation.");
                            (None, false)
                        }
                    }
                }
                None => (None, false),
            },
            _ => (None, false),
        };

        let mut categorized_by = None;
        let (category, ai_categorized) = match draft.category {
            Some(manual) => (Some(manual), false),
            None if options.auto_categorize => {
                let c = self.categorizer.categorize_detailed(&content, Some(content_type));
                categorized_by = Some(c.strategy.clone().unwrap_or_else(|| "default".to_string()));
                (Some(c.category), true)
            }
            None => (None, false),
        };

        let new = NewSubmission {
            user_id: session.user_id().to_string(),
            title: draft.title.trim().to_string(),
            content,
            content_type,
            language,
            dialect: draft.dialect,
            english_translation,
            ai_translated,
            category,
            ai_categorized,
            audio_url: draft.audio_url,
            featured: false,
            location: draft.location,
            cultural_context: draft.cultural_context,
        };
        let stored_at = Utc::now();
        let id = self.store.append_at(&new, stored_at)?;
        // The row is written from here on; later read failures only degrade the receipt.
        let submission = match self.store.get(&id) {
            Ok(Some(stored)) => stored,
            Ok(None) => new.into_submission(id.clone(), stored_at),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "stored submission could not be read back");
                new.into_submission(id.clone(), stored_at)
            }
        };

        tracing::info!(id = %id, user = %session.user_id(), language = language.code(), "submission stored");
        self.logbook.record_action(
            "commands",
            "submit",
            &json!({
                "id": id,
                "user_id": session.user_id(),
                "language": language.code(),
                "ai_translated": ai_translated,
                "category": category.map(|c| c.label()),
            }),
            "low",
        );

        let new_badges = match self.check_badges(session) {
            Ok(awarded) => awarded,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "badge check failed after submit");
                session.warn("Your story was saved, but badges could not be checked right now.");
                Vec::new()
            }
        };
        Ok(SubmitReceipt {
            submission,
            translated_by,
            categorized_by,
            new_badges,
        })
    }

    /// Transcribe `audio` into the draft's content, then submit as usual.
    pub fn submit_voice(
        &self,
        session: &mut Session,
        mut draft: SubmissionDraft,
        audio: &[u8],
        info: &AudioInfo,
        transcriber: &dyn Transcriber,
        options: SubmitOptions,
    ) -> Result<SubmitReceipt, SubmitError> {
        let check = validate_audio(info, &self.config.content);
        if !check.is_valid {
            return Err(ValidationError::Audio(check.errors.join("; ")).into());
        }
        for w in check.warnings {
            session.warn(w);
        }

        let hint = draft.language.map(|l| l.code());
        match transcriber.transcribe(audio, hint) {
            Ok(transcript) => {
                let confidence = transcript.confidence();
                if confidence < LOW_TRANSCRIPTION_CONFIDENCE {
                    session.warn(format!(
                        "Transcription confidence is low ({:.0}%). Please review the text.",
                        confidence * 100.0
                    ));
                }
                if draft.content.trim().is_empty() {
                    draft.content = transcript.text.trim().to_string();
                }
                self.logbook.record_action(
                    "commands",
                    "transcribed",
                    &json!({ "user_id": session.user_id(), "confidence": confidence, "bytes": audio.len() }),
                    "low",
                );
            }
            // Typed content stands on its own.
            Err(e) if !draft.content.trim().is_empty() => {
                tracing::warn!(user = %session.user_id(), error = %e, "transcription failed; keeping typed content");
                session.warn("Transcription unavailable; your typed text is used instead.");
            }
            Err(e) => return Err(e.into()),
        }
        if draft.audio_url.is_none() {
            draft.audio_url = Some(VOICE_RECORDING_MARKER.to_string());
        }
        self.submit(session, draft, options)
    }

    pub fn get(&self, id: &str) -> Result<Option<Submission>> {
        self.store.get(id)
    }

    /// Add one like. `None` when the submission does not exist.
    pub fn like(&self, session: &Session, id: &str) -> Result<Option<u64>> {
        let likes = self.store.add_likes(id, 1)?;
        if likes.is_some() {
            self.store
                .record_interaction(session.user_id(), id, InteractionType::Like)?;
            self.logbook.record_action(
                "commands",
                "like",
                &json!({ "id": id, "user_id": session.user_id(), "likes": likes }),
                "low",
            );
        }
        Ok(likes)
    }

    /// Record a share. `false` when the submission does not exist.
    pub fn share(&self, session: &Session, id: &str) -> Result<bool> {
        if self.store.get(id)?.is_none() {
            return Ok(false);
        }
        self.store
            .record_interaction(session.user_id(), id, InteractionType::Share)?;
        self.logbook.record_action(
            "commands",
            "share",
            &json!({ "id": id, "user_id": session.user_id() }),
            "low",
        );
        Ok(true)
    }

    pub fn feed(&self, filter: &SubmissionFilter, limit: usize) -> Result<Vec<Submission>> {
        self.store.query(filter, Some(limit))
    }

    pub fn featured(&self, limit: usize) -> Result<Vec<Submission>> {
        self.store.query(&SubmissionFilter::featured(), Some(limit))
    }

    pub fn search(&self, query: &str, filter: &SubmissionFilter) -> Result<Vec<Submission>> {
        self.store.search(query, filter)
    }

    pub fn set_featured(&self, id: &str, featured: bool) -> Result<bool> {
        let changed = self.store.update_field(id, FieldUpdate::Featured(featured))?;
        if changed {
            self.logbook.record_action(
                "commands",
                "set_featured",
                &json!({ "id": id, "featured": featured }),
                "medium",
            );
        }
        Ok(changed)
    }

    // ---------------- gamification ----------------

    fn raw_stats(&self, user_id: &str) -> Result<UserStats> {
        let subs = self.store.query(&SubmissionFilter::by_user(user_id), None)?;
        Ok(UserStats::from_submissions(user_id, &subs, Self::today()))
    }

    /// Stats with `badges` set to everything the user currently qualifies for.
    pub fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let mut stats = self.raw_stats(user_id)?;
        stats.badges = gamification::qualifying_badges(&stats, self.catalog());
        Ok(stats)
    }

    /// Award badges the session's user newly qualifies for and queue a notice for each.
    pub fn check_badges(&self, session: &mut Session) -> Result<Vec<BadgeKey>> {
        let mut stats = self.raw_stats(session.user_id())?;
        stats.badges = session.held_badges().clone();
        let awarded = gamification::check_and_award(&mut stats, self.catalog());
        for key in &awarded {
            if let Some(badge) = self.catalog().iter().find(|b| &b.key == key) {
                session.badge_earned(badge);
            }
        }
        if !awarded.is_empty() {
            tracing::info!(user = %session.user_id(), badges = ?awarded, "badges earned");
            self.logbook.record_action(
                "commands",
                "badges_awarded",
                &json!({ "user_id": session.user_id(), "badges": awarded }),
                "low",
            );
        }
        Ok(awarded)
    }

    pub fn achievement_progress(&self, user_id: &str) -> Result<Vec<AchievementProgress>> {
        let stats = self.user_stats(user_id)?;
        Ok(gamification::achievement_progress(&stats, self.catalog()))
    }

    pub fn user_badges(&self, user_id: &str) -> Result<Vec<BadgeDefinition>> {
        let stats = self.user_stats(user_id)?;
        Ok(gamification::user_badges(&stats, self.catalog())
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn available_badges(&self, user_id: &str) -> Result<Vec<BadgeDefinition>> {
        let stats = self.user_stats(user_id)?;
        Ok(gamification::available_badges(&stats, self.catalog())
            .into_iter()
            .cloned()
            .collect())
    }

    fn all_user_stats(&self) -> Result<Vec<UserStats>> {
        let subs = self.store.all_submissions()?;
        let today = Self::today();
        let mut by_user: BTreeMap<&str, Vec<Submission>> = BTreeMap::new();
        for s in &subs {
            by_user.entry(s.user_id.as_str()).or_default().push(s.clone());
        }
        Ok(by_user
            .into_iter()
            .map(|(user, list)| {
                let mut stats = UserStats::from_submissions(user, &list, today);
                stats.badges = gamification::qualifying_badges(&stats, self.catalog());
                stats
            })
            .collect())
    }

    pub fn leaderboard(&self, metric: Metric, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let stats = self.all_user_stats()?;
        let names: HashMap<String, String> = self
            .store
            .profiles()?
            .into_iter()
            .map(|p| (p.user_id, p.display_name))
            .collect();
        Ok(leaderboard::leaderboard(&stats, metric, limit, &names))
    }

    /// Position within the configured leaderboard size.
    pub fn rank_of(&self, user_id: &str, metric: Metric) -> Result<Rank> {
        let stats = self.all_user_stats()?;
        Ok(leaderboard::rank_of(
            &stats,
            user_id,
            metric,
            self.config.gamification.leaderboard_size,
        ))
    }

    pub fn daily_challenge(&self, date: NaiveDate) -> &'static DailyChallenge {
        gamification::daily_challenge(date)
    }

    // ---------------- analytics & suggestions ----------------

    pub fn analytics(&self) -> Result<Analytics> {
        let subs = self.store.all_submissions()?;
        Ok(analytics::compute(&subs, Self::today(), &self.config.gamification))
    }

    /// Other categories worth offering for `content`, with their keyword confidence.
    pub fn category_suggestions(&self, content: &str, current: Category) -> Vec<CategorySuggestion> {
        self.categorizer
            .alternatives(content, current)
            .into_iter()
            .map(|category| CategorySuggestion {
                category,
                confidence: self.categorizer.confidence(content, category),
            })
            .collect()
    }

    pub fn category_confidence(&self, content: &str, category: Category) -> f32 {
        self.categorizer.confidence(content, category)
    }
}
