// src/services/store.rs
//! Record store for submissions, interactions and user profiles.
//!
//! - `RecordStore` is the seam the Commands facade talks to.
//! - `SqliteStore` owns a single SQLite connection (WAL).
//! - `id` and `timestamp` are written once by `append` and never updated.
//! - Likes change through one `UPDATE .. MAX(0, likes + ?)` statement, so the
//!   count cannot go negative and concurrent increments do not lose updates.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use taxonomy::{Category, ContentType, Language};

// ---------------- records ----------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub language: Language,
    pub dialect: Option<String>,
    pub english_translation: Option<String>,
    pub ai_translated: bool,
    pub category: Option<Category>,
    pub ai_categorized: bool,
    pub audio_url: Option<String>,
    pub likes: u64,
    pub featured: bool,
    pub location: Option<String>,
    pub cultural_context: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Everything `append` needs; the store assigns `id`, `timestamp` and starts `likes` at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub language: Language,
    #[serde(default)]
    pub dialect: Option<String>,
    #[serde(default)]
    pub english_translation: Option<String>,
    #[serde(default)]
    pub ai_translated: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub ai_categorized: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cultural_context: Option<String>,
}

impl NewSubmission {
    /// The row as `append` stores it, with no likes yet.
    pub fn into_submission(self, id: String, timestamp: DateTime<Utc>) -> Submission {
        Submission {
            id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            content_type: self.content_type,
            language: self.language,
            dialect: self.dialect,
            english_translation: self.english_translation,
            ai_translated: self.ai_translated,
            category: self.category,
            ai_categorized: self.ai_categorized,
            audio_url: self.audio_url,
            likes: 0,
            featured: self.featured,
            location: self.location,
            cultural_context: self.cultural_context,
            timestamp,
        }
    }
}

/// The mutable columns. `id`, `timestamp` and `likes` have no variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Content(String),
    Dialect(Option<String>),
    Translation {
        text: Option<String>,
        ai_translated: bool,
    },
    Category {
        category: Option<Category>,
        ai_categorized: bool,
    },
    AudioUrl(Option<String>),
    Featured(bool),
    Location(Option<String>),
    CulturalContext(Option<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFilter {
    pub user_id: Option<String>,
    pub language: Option<Language>,
    pub category: Option<Category>,
    pub content_type: Option<ContentType>,
    pub featured: Option<bool>,
}

impl SubmissionFilter {
    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn featured() -> Self {
        Self {
            featured: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Like,
    Share,
    Comment,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Share => "share",
            InteractionType::Comment => "comment",
        }
    }
}

impl FromStr for InteractionType {
    type Err = taxonomy::UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(InteractionType::Like),
            "share" => Ok(InteractionType::Share),
            "comment" => Ok(InteractionType::Comment),
            _ => Err(taxonomy::UnknownLabel::new("interaction type", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub user_id: String,
    pub submission_id: String,
    pub kind: InteractionType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub native_language: Option<Language>,
    #[serde(default)]
    pub location: Option<String>,
    pub joined_at: DateTime<Utc>,
}

// ---------------- trait ----------------

pub trait RecordStore {
    /// Insert with an explicit creation time (imports, backfills).
    fn append_at(&self, new: &NewSubmission, at: DateTime<Utc>) -> Result<String>;

    /// Insert now; returns the new id.
    fn append(&self, new: &NewSubmission) -> Result<String> {
        self.append_at(new, Utc::now())
    }

    fn get(&self, id: &str) -> Result<Option<Submission>>;

    /// Matching submissions, newest first.
    fn query(&self, filter: &SubmissionFilter, limit: Option<usize>) -> Result<Vec<Submission>>;

    /// `false` when no submission has `id`.
    fn update_field(&self, id: &str, update: FieldUpdate) -> Result<bool>;

    /// Case-insensitive substring match over title, content and translation, newest first.
    fn search(&self, text: &str, filter: &SubmissionFilter) -> Result<Vec<Submission>>;

    /// Add `delta` (may be negative) to likes, clamped at 0. `None` when `id` is unknown.
    fn add_likes(&self, id: &str, delta: i64) -> Result<Option<u64>>;

    fn record_interaction(&self, user_id: &str, submission_id: &str, kind: InteractionType) -> Result<Interaction>;

    fn interactions_for(&self, submission_id: &str) -> Result<Vec<Interaction>>;

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    fn profiles(&self) -> Result<Vec<UserProfile>>;

    fn all_submissions(&self) -> Result<Vec<Submission>> {
        self.query(&SubmissionFilter::default(), None)
    }
}

// ---------------- sqlite ----------------

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS submissions (
  id                  TEXT PRIMARY KEY,   -- uuid v4, immutable
  user_id             TEXT NOT NULL,
  title               TEXT NOT NULL,
  content             TEXT NOT NULL,
  content_type        TEXT NOT NULL,      -- ContentType label
  language            TEXT NOT NULL,      -- ISO 639-1 code
  dialect             TEXT,
  english_translation TEXT,
  ai_translated       INTEGER NOT NULL DEFAULT 0,
  category            TEXT,               -- Category label
  ai_categorized      INTEGER NOT NULL DEFAULT 0,
  audio_url           TEXT,
  likes               INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
  featured            INTEGER NOT NULL DEFAULT 0,
  location            TEXT,
  cultural_context    TEXT,
  timestamp           TEXT NOT NULL       -- RFC3339 UTC, fixed width, immutable
);

CREATE INDEX IF NOT EXISTS idx_sub_user ON submissions(user_id);
CREATE INDEX IF NOT EXISTS idx_sub_ts ON submissions(timestamp);

CREATE TABLE IF NOT EXISTS interactions (
  id            TEXT PRIMARY KEY,
  user_id       TEXT NOT NULL,
  submission_id TEXT NOT NULL,
  kind          TEXT NOT NULL,
  timestamp     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_int_sub ON interactions(submission_id);

CREATE TABLE IF NOT EXISTS users (
  user_id         TEXT PRIMARY KEY,
  display_name    TEXT NOT NULL,
  native_language TEXT,
  location        TEXT,
  joined_at       TEXT NOT NULL
);
"#;

const SUBMISSION_COLUMNS: &str = "id, user_id, title, content, content_type, language, dialect, \
     english_translation, ai_translated, category, ai_categorized, audio_url, likes, featured, \
     location, cultural_context, timestamp";

pub struct SqliteStore {
    pub(crate) db: Connection,
}

impl SqliteStore {
    /// Open/create the DB file and ensure schema. Creates the parent directory.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create_dir_all({:?})", parent))?;
        }
        let db = Connection::open(db_path)
            .with_context(|| format!("opening sqlite store {}", db_path.display()))?;
        Self::with_connection(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        db.execute_batch(SCHEMA).context("applying store schema")?;
        Ok(Self { db })
    }
}

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn ts_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: String = row.get(idx)?;
    s.parse::<T>().map_err(|e| conversion_err(idx, e))
}

fn parse_opt_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: Option<String> = row.get(idx)?;
    s.map(|s| s.parse::<T>().map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    let likes: i64 = row.get(12)?;
    Ok(Submission {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        content_type: parse_col(row, 4)?,
        language: parse_col(row, 5)?,
        dialect: row.get(6)?,
        english_translation: row.get(7)?,
        ai_translated: row.get(8)?,
        category: parse_opt_col(row, 9)?,
        ai_categorized: row.get(10)?,
        audio_url: row.get(11)?,
        likes: likes.max(0) as u64,
        featured: row.get(13)?,
        location: row.get(14)?,
        cultural_context: row.get(15)?,
        timestamp: ts_from_row(row, 16)?,
    })
}

fn row_to_interaction(row: &Row<'_>) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        submission_id: row.get(2)?,
        kind: parse_col(row, 3)?,
        timestamp: ts_from_row(row, 4)?,
    })
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        native_language: parse_opt_col(row, 2)?,
        location: row.get(3)?,
        joined_at: ts_from_row(row, 4)?,
    })
}

/// `WHERE` clause plus positional parameters for a filter.
fn filter_clause(filter: &SubmissionFilter) -> (String, Vec<SqlValue>) {
    let mut conds: Vec<String> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();
    let mut push = |col: &str, v: SqlValue| {
        params.push(v);
        conds.push(format!("{col} = ?{}", params.len()));
    };
    if let Some(user) = &filter.user_id {
        push("user_id", SqlValue::Text(user.clone()));
    }
    if let Some(lang) = filter.language {
        push("language", SqlValue::Text(lang.code().to_string()));
    }
    if let Some(cat) = filter.category {
        push("category", SqlValue::Text(cat.label().to_string()));
    }
    if let Some(ct) = filter.content_type {
        push("content_type", SqlValue::Text(ct.label().to_string()));
    }
    if let Some(featured) = filter.featured {
        push("featured", SqlValue::Integer(featured as i64));
    }
    let clause = if conds.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conds.join(" AND "))
    };
    (clause, params)
}

impl RecordStore for SqliteStore {
    fn append_at(&self, new: &NewSubmission, at: DateTime<Utc>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.db.execute(
            &format!(
                "INSERT INTO submissions({SUBMISSION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13, ?14, ?15, ?16)"
            ),
            rusqlite::params![
                &id,
                &new.user_id,
                &new.title,
                &new.content,
                new.content_type.label(),
                new.language.code(),
                &new.dialect,
                &new.english_translation,
                new.ai_translated,
                new.category.map(|c| c.label()),
                new.ai_categorized,
                &new.audio_url,
                new.featured,
                &new.location,
                &new.cultural_context,
                ts_to_sql(&at),
            ],
        )?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<Submission>> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");
        Ok(self.db.query_row(&sql, [id], row_to_submission).optional()?)
    }

    fn query(&self, filter: &SubmissionFilter, limit: Option<usize>) -> Result<Vec<Submission>> {
        let (clause, mut params) = filter_clause(filter);
        let mut sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions{clause} ORDER BY timestamp DESC, rowid DESC"
        );
        if let Some(n) = limit {
            params.push(SqlValue::Integer(n as i64));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), row_to_submission)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn update_field(&self, id: &str, update: FieldUpdate) -> Result<bool> {
        let changed = match update {
            FieldUpdate::Title(v) => self
                .db
                .execute("UPDATE submissions SET title = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::Content(v) => self
                .db
                .execute("UPDATE submissions SET content = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::Dialect(v) => self
                .db
                .execute("UPDATE submissions SET dialect = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::Translation { text, ai_translated } => self.db.execute(
                "UPDATE submissions SET english_translation = ?1, ai_translated = ?2 WHERE id = ?3",
                (text, ai_translated, id),
            )?,
            FieldUpdate::Category {
                category,
                ai_categorized,
            } => self.db.execute(
                "UPDATE submissions SET category = ?1, ai_categorized = ?2 WHERE id = ?3",
                (category.map(|c| c.label()), ai_categorized, id),
            )?,
            FieldUpdate::AudioUrl(v) => self
                .db
                .execute("UPDATE submissions SET audio_url = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::Featured(v) => self
                .db
                .execute("UPDATE submissions SET featured = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::Location(v) => self
                .db
                .execute("UPDATE submissions SET location = ?1 WHERE id = ?2", (v, id))?,
            FieldUpdate::CulturalContext(v) => self.db.execute(
                "UPDATE submissions SET cultural_context = ?1 WHERE id = ?2",
                (v, id),
            )?,
        };
        Ok(changed > 0)
    }

    fn search(&self, text: &str, filter: &SubmissionFilter) -> Result<Vec<Submission>> {
        let needle = taxonomy::normalize_for_search(text.trim());
        let all = self.query(filter, None)?;
        if needle.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|s| {
                let fields = [
                    Some(s.title.as_str()),
                    Some(s.content.as_str()),
                    s.english_translation.as_deref(),
                ];
                fields
                    .into_iter()
                    .flatten()
                    .any(|f| taxonomy::normalize_for_search(f).contains(&needle))
            })
            .collect())
    }

    fn add_likes(&self, id: &str, delta: i64) -> Result<Option<u64>> {
        let likes: Option<i64> = self
            .db
            .query_row(
                "UPDATE submissions SET likes = MAX(0, likes + ?1) WHERE id = ?2 RETURNING likes",
                (delta, id),
                |row| row.get(0),
            )
            .optional()?;
        Ok(likes.map(|n| n.max(0) as u64))
    }

    fn record_interaction(&self, user_id: &str, submission_id: &str, kind: InteractionType) -> Result<Interaction> {
        let rec = Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            submission_id: submission_id.to_string(),
            kind,
            timestamp: Utc::now(),
        };
        self.db.execute(
            "INSERT INTO interactions(id, user_id, submission_id, kind, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &rec.id,
                &rec.user_id,
                &rec.submission_id,
                rec.kind.as_str(),
                ts_to_sql(&rec.timestamp),
            ),
        )?;
        Ok(rec)
    }

    fn interactions_for(&self, submission_id: &str) -> Result<Vec<Interaction>> {
        let mut stmt = self.db.prepare(
            "SELECT id, user_id, submission_id, kind, timestamp FROM interactions
             WHERE submission_id = ?1 ORDER BY timestamp ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([submission_id], row_to_interaction)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.db.execute(
            r#"
            INSERT INTO users(user_id, display_name, native_language, location, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
              display_name    = excluded.display_name,
              native_language = excluded.native_language,
              location        = excluded.location
            "#,
            (
                &profile.user_id,
                &profile.display_name,
                profile.native_language.map(|l| l.code()),
                &profile.location,
                ts_to_sql(&profile.joined_at),
            ),
        )?;
        Ok(())
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .db
            .query_row(
                "SELECT user_id, display_name, native_language, location, joined_at FROM users WHERE user_id = ?1",
                [user_id],
                row_to_profile,
            )
            .optional()?)
    }

    fn profiles(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.db.prepare(
            "SELECT user_id, display_name, native_language, location, joined_at FROM users ORDER BY user_id",
        )?;
        let rows = stmt.query_map([], row_to_profile)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user: &str, title: &str) -> NewSubmission {
        NewSubmission {
            user_id: user.into(),
            title: title.into(),
            content: "Jal hi jeevan hai".into(),
            content_type: ContentType::Proverb,
            language: Language::Hindi,
            dialect: None,
            english_translation: Some("Water is life".into()),
            ai_translated: true,
            category: Some(Category::Nature),
            ai_categorized: true,
            audio_url: None,
            featured: false,
            location: None,
            cultural_context: None,
        }
    }

    #[test]
    fn append_then_get_round_trips_enums() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.append(&sample("u1", "Water")).unwrap();
        let got = store.get(&id).unwrap().unwrap();
        assert_eq!(got.language, Language::Hindi);
        assert_eq!(got.category, Some(Category::Nature));
        assert_eq!(got.content_type, ContentType::Proverb);
        assert_eq!(got.likes, 0);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn filter_clause_numbers_params_in_order() {
        let f = SubmissionFilter {
            user_id: Some("u".into()),
            featured: Some(true),
            ..SubmissionFilter::default()
        };
        let (clause, params) = filter_clause(&f);
        assert_eq!(clause, " WHERE user_id = ?1 AND featured = ?2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn interaction_type_parses_case_insensitively() {
        assert_eq!("Share".parse::<InteractionType>().unwrap(), InteractionType::Share);
        assert!("poke".parse::<InteractionType>().is_err());
    }

    #[test]
    fn file_backed_store_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("voices.db");
        let store = SqliteStore::open(&path).unwrap();
        store.append(&sample("u1", "Water")).unwrap();
        assert!(path.exists());
    }
}
