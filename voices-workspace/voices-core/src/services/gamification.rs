//! services/gamification.rs
//! Badges, streaks, achievement progress and the daily challenge.
//!
//! Everything here is a pure function of a user's submissions and a badge
//! catalog; awarding only mutates the caller's `UserStats`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taxonomy::{Category, Language};

use crate::services::store::Submission;

pub type BadgeKey = String;

/// What a badge asks for. Serialized as `{ kind = "submissions", count = 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Requirement {
    Submissions(u64),
    Languages(u64),
    Likes(u64),
    Streak(u64),
}

impl Requirement {
    pub fn target(&self) -> u64 {
        match *self {
            Requirement::Submissions(n)
            | Requirement::Languages(n)
            | Requirement::Likes(n)
            | Requirement::Streak(n) => n,
        }
    }

    /// The stat this requirement measures, for `stats`.
    pub fn current(&self, stats: &UserStats) -> u64 {
        match self {
            Requirement::Submissions(_) => stats.total_submissions,
            Requirement::Languages(_) => stats.languages_used.len() as u64,
            Requirement::Likes(_) => stats.total_likes,
            Requirement::Streak(_) => u64::from(stats.streak),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub key: BadgeKey,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "BadgeDefinition::default_icon")]
    pub icon: String,
    pub requirement: Requirement,
}

impl BadgeDefinition {
    fn default_icon() -> String {
        "🏅".to_string()
    }

    fn new(key: &str, name: &str, description: &str, icon: &str, requirement: Requirement) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            requirement,
        }
    }
}

/// The built-in catalog, in display order.
pub fn default_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new("first_story", "First Steps", "Submitted your first story", "🌱", Requirement::Submissions(1)),
        BadgeDefinition::new("cultural_preserver", "Cultural Preserver", "Submitted 10 stories", "🏛️", Requirement::Submissions(10)),
        BadgeDefinition::new("story_weaver", "Story Weaver", "Submitted 25 stories", "🧵", Requirement::Submissions(25)),
        BadgeDefinition::new("wisdom_keeper", "Wisdom Keeper", "Submitted 50 stories", "📚", Requirement::Submissions(50)),
        BadgeDefinition::new("multilingual", "Multilingual Master", "Submitted stories in 3+ languages", "🌍", Requirement::Languages(3)),
        BadgeDefinition::new("community_favorite", "Community Favorite", "Received 100+ likes", "❤️", Requirement::Likes(100)),
        BadgeDefinition::new("streak_master", "Streak Master", "7-day submission streak", "🔥", Requirement::Streak(7)),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub total_submissions: u64,
    pub total_likes: u64,
    pub languages_used: BTreeSet<Language>,
    pub categories_used: BTreeSet<Category>,
    pub streak: u32,
    /// Badges already held; `check_and_award` never returns these again.
    pub badges: BTreeSet<BadgeKey>,
    pub first_submission: Option<DateTime<Utc>>,
    pub last_submission: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Aggregate `submissions` belonging to `user_id`; others are ignored.
    /// `badges` starts empty.
    pub fn from_submissions(user_id: &str, submissions: &[Submission], today: NaiveDate) -> Self {
        let mut stats = UserStats {
            user_id: user_id.to_string(),
            ..UserStats::default()
        };
        let mut dates = Vec::new();
        for s in submissions.iter().filter(|s| s.user_id == user_id) {
            stats.total_submissions += 1;
            stats.total_likes += s.likes;
            stats.languages_used.insert(s.language);
            if let Some(c) = s.category {
                stats.categories_used.insert(c);
            }
            stats.first_submission = Some(match stats.first_submission {
                Some(t) if t <= s.timestamp => t,
                _ => s.timestamp,
            });
            stats.last_submission = Some(match stats.last_submission {
                Some(t) if t >= s.timestamp => t,
                _ => s.timestamp,
            });
            dates.push(s.timestamp.date_naive());
        }
        stats.streak = compute_streak(dates, today);
        stats
    }
}

/// Consecutive days with at least one submission, counting back from `today`.
/// No submission on `today` means no streak.
pub fn compute_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

pub fn qualifies(stats: &UserStats, badge: &BadgeDefinition) -> bool {
    badge.requirement.current(stats) >= badge.requirement.target()
}

/// Keys of every catalog badge `stats` currently meets, held or not.
pub fn qualifying_badges(stats: &UserStats, catalog: &[BadgeDefinition]) -> BTreeSet<BadgeKey> {
    catalog
        .iter()
        .filter(|b| qualifies(stats, b))
        .map(|b| b.key.clone())
        .collect()
}

/// Newly earned badges in catalog order. They are added to `stats.badges`,
/// so calling again with unchanged stats returns nothing.
pub fn check_and_award(stats: &mut UserStats, catalog: &[BadgeDefinition]) -> Vec<BadgeKey> {
    let mut awarded = Vec::new();
    for badge in catalog {
        if stats.badges.contains(&badge.key) || !qualifies(stats, badge) {
            continue;
        }
        stats.badges.insert(badge.key.clone());
        awarded.push(badge.key.clone());
    }
    awarded
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub key: BadgeKey,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub completed: bool,
    pub current: u64,
    pub target: u64,
    pub percent: f32,
}

pub fn achievement_progress(stats: &UserStats, catalog: &[BadgeDefinition]) -> Vec<AchievementProgress> {
    catalog
        .iter()
        .map(|b| {
            let current = b.requirement.current(stats);
            let target = b.requirement.target();
            let percent = if target == 0 {
                100.0
            } else {
                (current as f32 / target as f32 * 100.0).min(100.0)
            };
            AchievementProgress {
                key: b.key.clone(),
                name: b.name.clone(),
                icon: b.icon.clone(),
                description: b.description.clone(),
                completed: stats.badges.contains(&b.key) || current >= target,
                current,
                target,
                percent,
            }
        })
        .collect()
}

/// Held badges as catalog entries, in catalog order. Unknown keys are skipped.
pub fn user_badges<'a>(stats: &UserStats, catalog: &'a [BadgeDefinition]) -> Vec<&'a BadgeDefinition> {
    catalog.iter().filter(|b| stats.badges.contains(&b.key)).collect()
}

/// Catalog entries not yet held.
pub fn available_badges<'a>(stats: &UserStats, catalog: &'a [BadgeDefinition]) -> Vec<&'a BadgeDefinition> {
    catalog.iter().filter(|b| !stats.badges.contains(&b.key)).collect()
}

// ---------------- daily challenge ----------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyChallenge {
    pub title: &'static str,
    pub description: &'static str,
    pub reward_points: u32,
    pub icon: &'static str,
}

pub const CHALLENGES: [DailyChallenge; 5] = [
    DailyChallenge {
        title: "Share a Proverb",
        description: "Submit a traditional proverb from your culture",
        reward_points: 10,
        icon: "🌟",
    },
    DailyChallenge {
        title: "Voice Recording",
        description: "Record a story using voice input",
        reward_points: 15,
        icon: "🎤",
    },
    DailyChallenge {
        title: "New Language",
        description: "Submit a story in a language you haven't used before",
        reward_points: 20,
        icon: "🌍",
    },
    DailyChallenge {
        title: "Community Engagement",
        description: "Like and comment on 5 community stories",
        reward_points: 5,
        icon: "❤️",
    },
    DailyChallenge {
        title: "Cultural Context",
        description: "Add detailed cultural context to your submission",
        reward_points: 10,
        icon: "📚",
    },
];

/// Rotates by day of year (1-based).
pub fn daily_challenge(date: NaiveDate) -> &'static DailyChallenge {
    &CHALLENGES[date.ordinal() as usize % CHALLENGES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn streak_counts_back_from_today_until_gap() {
        let today = day(2024, 3, 10);
        let dates = [0, 1, 2, 4].map(|back| today - chrono::Duration::days(back));
        assert_eq!(compute_streak(dates, today), 3);
    }

    #[test]
    fn streak_is_zero_without_submission_today() {
        let today = day(2024, 3, 10);
        assert_eq!(compute_streak([day(2024, 3, 9), day(2024, 3, 8)], today), 0);
        assert_eq!(compute_streak(Vec::new(), today), 0);
    }

    #[test]
    fn duplicate_dates_count_once() {
        let today = day(2024, 1, 1);
        assert_eq!(compute_streak([today, today, day(2023, 12, 31)], today), 2);
    }

    #[test]
    fn requirements_read_the_matching_stat() {
        let stats = UserStats {
            total_submissions: 12,
            total_likes: 40,
            streak: 2,
            languages_used: [Language::Hindi, Language::Tamil].into_iter().collect(),
            ..UserStats::default()
        };
        assert_eq!(Requirement::Submissions(10).current(&stats), 12);
        assert_eq!(Requirement::Languages(3).current(&stats), 2);
        assert_eq!(Requirement::Likes(100).current(&stats), 40);
        assert_eq!(Requirement::Streak(7).current(&stats), 2);
    }

    #[test]
    fn award_is_idempotent() {
        let catalog = default_badges();
        let mut stats = UserStats {
            total_submissions: 10,
            ..UserStats::default()
        };
        let first = check_and_award(&mut stats, &catalog);
        assert_eq!(first, vec!["first_story".to_string(), "cultural_preserver".to_string()]);
        assert!(check_and_award(&mut stats, &catalog).is_empty());
    }

    #[test]
    fn progress_is_capped_at_100() {
        let catalog = default_badges();
        let stats = UserStats {
            total_submissions: 30,
            ..UserStats::default()
        };
        let progress = achievement_progress(&stats, &catalog);
        let weaver = progress.iter().find(|p| p.key == "story_weaver").unwrap();
        assert!(weaver.completed);
        assert_eq!(weaver.percent, 100.0);
        let keeper = progress.iter().find(|p| p.key == "wisdom_keeper").unwrap();
        assert!(!keeper.completed);
        assert!((keeper.percent - 60.0).abs() < 1e-4);
    }

    #[test]
    fn requirement_toml_shape() {
        #[derive(Deserialize)]
        struct Wrapper {
            badges: Vec<BadgeDefinition>,
        }
        let w: Wrapper = toml::from_str(
            r#"
            [[badges]]
            key = "storyteller"
            name = "Storyteller"
            requirement = { kind = "submissions", count = 5 }
            "#,
        )
        .unwrap();
        assert_eq!(w.badges[0].requirement, Requirement::Submissions(5));
        assert_eq!(w.badges[0].icon, "🏅");
    }

    #[test]
    fn challenge_rotates_by_ordinal() {
        // Jan 1 is ordinal 1
        assert_eq!(daily_challenge(day(2024, 1, 1)).title, "Voice Recording");
        assert_eq!(daily_challenge(day(2024, 1, 5)).title, "Share a Proverb");
    }
}
