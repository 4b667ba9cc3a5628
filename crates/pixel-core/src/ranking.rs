//! Leaderboard ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub nickname: String,
    pub total_pixels: u64,
    pub total_spent: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An entry with its 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: u32,
    pub entry: LeaderboardEntry,
}

fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_pixels
        .cmp(&a.total_pixels)
        .then_with(|| b.total_spent.cmp(&a.total_spent))
        .then_with(|| a.nickname.cmp(&b.nickname))
}

/// Sorts by pixels owned, then sats spent (both descending), then nickname.
///
/// Entries tied on pixels and spend share a rank; the next rank skips
/// accordingly (1, 1, 3).
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<RankedEntry> {
    entries.sort_by(compare);

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev)
                if prev.entry.total_pixels == entry.total_pixels
                    && prev.entry.total_spent == entry.total_spent =>
            {
                prev.rank
            }
            _ => (idx + 1) as u32,
        };
        ranked.push(RankedEntry { rank, entry });
    }
    ranked
}
