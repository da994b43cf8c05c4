//! services/analytics.rs
//! Collection-wide numbers for the dashboard.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::GamificationConfig;
use crate::services::store::Submission;

pub const RECENT_ACTIVITY: usize = 10;
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total_submissions: u64,
    pub total_users: u64,
    pub total_likes: u64,
    pub languages_count: usize,
    /// Language display name → count.
    pub languages_distribution: BTreeMap<String, u64>,
    /// Category label (or "Uncategorized") → count.
    pub categories_distribution: BTreeMap<String, u64>,
    pub content_types_distribution: BTreeMap<String, u64>,
    /// Newest first.
    pub recent_activity: Vec<Submission>,
    pub today_count: u64,
    pub daily_target: u64,
    pub daily_percent: f32,
    pub collection_target: u64,
    pub collection_percent: f32,
}

fn percent(value: u64, target: u64) -> f32 {
    if target == 0 {
        return 100.0;
    }
    (value as f32 / target as f32 * 100.0).min(100.0)
}

pub fn compute(submissions: &[Submission], today: NaiveDate, targets: &GamificationConfig) -> Analytics {
    let mut users = BTreeSet::new();
    let mut languages = BTreeMap::new();
    let mut categories = BTreeMap::new();
    let mut content_types = BTreeMap::new();
    let mut total_likes = 0;
    let mut today_count = 0;

    for s in submissions {
        users.insert(s.user_id.as_str());
        *languages.entry(s.language.name().to_string()).or_insert(0) += 1;
        let cat = s.category.map(|c| c.label()).unwrap_or(UNCATEGORIZED);
        *categories.entry(cat.to_string()).or_insert(0) += 1;
        *content_types.entry(s.content_type.label().to_string()).or_insert(0) += 1;
        total_likes += s.likes;
        if s.timestamp.date_naive() == today {
            today_count += 1;
        }
    }

    let mut recent: Vec<Submission> = submissions.to_vec();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(RECENT_ACTIVITY);

    let total = submissions.len() as u64;
    Analytics {
        total_submissions: total,
        total_users: users.len() as u64,
        total_likes,
        languages_count: languages.len(),
        languages_distribution: languages,
        categories_distribution: categories,
        content_types_distribution: content_types,
        recent_activity: recent,
        today_count,
        daily_target: targets.daily_target,
        daily_percent: percent(today_count, targets.daily_target),
        collection_target: targets.collection_target,
        collection_percent: percent(total, targets.collection_target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_caps_and_handles_zero_target() {
        assert_eq!(percent(5, 10), 50.0);
        assert_eq!(percent(50, 10), 100.0);
        assert_eq!(percent(1, 0), 100.0);
    }

    #[test]
    fn empty_collection() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let a = compute(&[], today, &GamificationConfig::default());
        assert_eq!(a.total_submissions, 0);
        assert_eq!(a.collection_percent, 0.0);
        assert!(a.recent_activity.is_empty());
    }
}
