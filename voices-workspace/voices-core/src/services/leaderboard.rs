//! services/leaderboard.rs
//! Rank users by a single metric.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::services::gamification::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Submissions,
    Likes,
    Badges,
    Streak,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Submissions, Metric::Likes, Metric::Badges, Metric::Streak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Submissions => "submissions",
            Metric::Likes => "likes",
            Metric::Badges => "badges",
            Metric::Streak => "streak",
        }
    }

    pub fn value(&self, stats: &UserStats) -> u64 {
        match self {
            Metric::Submissions => stats.total_submissions,
            Metric::Likes => stats.total_likes,
            Metric::Badges => stats.badges.len() as u64,
            Metric::Streak => u64::from(stats.streak),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = taxonomy::UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| taxonomy::UnknownLabel::new("leaderboard metric", s))
    }
}

/// Position on a board. Users outside the window are `Unranked`, never position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Position(usize),
    Unranked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub value: u64,
}

/// Top `limit` users by `metric`, value descending, ties by user id ascending.
/// `names` maps user ids to display names; missing names fall back to the id.
pub fn leaderboard(
    stats: &[UserStats],
    metric: Metric,
    limit: usize,
    names: &HashMap<String, String>,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(&str, u64)> = stats
        .iter()
        .map(|s| (s.user_id.as_str(), metric.value(s)))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (user_id, value))| LeaderboardEntry {
            rank: i + 1,
            user_id: user_id.to_string(),
            display_name: names
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| user_id.to_string()),
            value,
        })
        .collect()
}

/// Where `user_id` sits within the top `limit`.
pub fn rank_of(stats: &[UserStats], user_id: &str, metric: Metric, limit: usize) -> Rank {
    leaderboard(stats, metric, limit, &HashMap::new())
        .iter()
        .find(|e| e.user_id == user_id)
        .map(|e| Rank::Position(e.rank))
        .unwrap_or(Rank::Unranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(user: &str, subs: u64) -> UserStats {
        UserStats {
            user_id: user.into(),
            total_submissions: subs,
            ..UserStats::default()
        }
    }

    #[test]
    fn ties_break_by_user_id() {
        let all = vec![stats("zoe", 3), stats("amir", 3), stats("lin", 5)];
        let board = leaderboard(&all, Metric::Submissions, 10, &HashMap::new());
        let order: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["lin", "amir", "zoe"]);
        assert_eq!(board[0].rank, 1);
    }

    #[test]
    fn outside_window_is_unranked() {
        let all = vec![stats("a", 9), stats("b", 5), stats("c", 1)];
        assert_eq!(rank_of(&all, "a", Metric::Submissions, 2), Rank::Position(1));
        assert_eq!(rank_of(&all, "c", Metric::Submissions, 2), Rank::Unranked);
        assert_eq!(rank_of(&all, "nobody", Metric::Submissions, 2), Rank::Unranked);
    }

    #[test]
    fn display_names_fall_back_to_id() {
        let names: HashMap<String, String> = [("a".to_string(), "Asha".to_string())].into_iter().collect();
        let board = leaderboard(&[stats("a", 1), stats("b", 1)], Metric::Submissions, 5, &names);
        assert_eq!(board[0].display_name, "Asha");
        assert_eq!(board[1].display_name, "b");
    }

    #[test]
    fn metric_parses_case_insensitively() {
        assert_eq!("Likes".parse::<Metric>().unwrap(), Metric::Likes);
        assert!("karma".parse::<Metric>().is_err());
    }
}
