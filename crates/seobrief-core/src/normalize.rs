//! Turn a heterogeneous SERP item list into a ranked competitor shortlist.

use crate::SearchResultItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_MAX_COMPETITORS: usize = 3;
pub const DEFAULT_MAX_SNAPSHOT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// 1-based position within the snapshot.
    pub position: usize,
    pub title: String,
    pub url: String,
}

/// The best organic rank. Position-1 SERP features (ads, AI overviews) do not count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopRankInfo {
    pub rank_group: u32,
    pub items: Vec<SearchResultItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Normalized {
    pub competitors: Vec<SearchResultItem>,
    pub snapshot: Vec<SnapshotEntry>,
    pub top_rank: Option<TopRankInfo>,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty() && self.snapshot.is_empty() && self.top_rank.is_none()
    }
}

/// Pure function of `items`: no IO, no randomness.
pub fn normalize(
    items: &[SearchResultItem],
    max_competitors: usize,
    max_snapshot: usize,
) -> Normalized {
    let organic: Vec<&SearchResultItem> = items
        .iter()
        .filter(|it| it.is_organic() && it.url().is_some())
        .collect();
    let mut pool = if organic.is_empty() {
        items.iter().filter(|it| it.url().is_some()).collect()
    } else {
        organic
    };
    // `sort_by_key` is stable: equal ranks keep input order.
    pool.sort_by_key(|it| it.rank_key());

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let competitors = pool
        .iter()
        .copied()
        .filter(|it| it.url().is_some_and(|u| seen.insert(u)))
        .take(max_competitors)
        .cloned()
        .collect();

    let snapshot = pool
        .iter()
        .take(max_snapshot)
        .enumerate()
        .filter_map(|(i, it)| {
            let url = it.url()?.to_string();
            let title = it
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| url.clone());
            Some(SnapshotEntry {
                position: i + 1,
                title,
                url,
            })
        })
        .collect();

    Normalized {
        competitors,
        snapshot,
        top_rank: top_organic_rank(items),
    }
}

fn top_organic_rank(items: &[SearchResultItem]) -> Option<TopRankInfo> {
    let best = items
        .iter()
        .filter(|it| it.is_organic())
        .filter_map(|it| it.rank_group)
        .min()?;
    let items = items
        .iter()
        .filter(|it| it.is_organic() && it.rank_group == Some(best))
        .cloned()
        .collect();
    Some(TopRankInfo {
        rank_group: best,
        items,
    })
}
