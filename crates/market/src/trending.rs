use serde::{Deserialize, Serialize};

use crate::record::AssetRecord;

pub const DEFAULT_MOVERS_LIMIT: usize = 10;
pub const DEFAULT_TRENDING_LIMIT: usize = 15;

/// Highest 24h change first.
pub fn top_gainers(records: &[AssetRecord], limit: usize) -> Vec<AssetRecord> {
    let mut sorted: Vec<&AssetRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    take_owned(sorted, limit)
}

/// Lowest 24h change first.
pub fn top_losers(records: &[AssetRecord], limit: usize) -> Vec<AssetRecord> {
    let mut sorted: Vec<&AssetRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
    take_owned(sorted, limit)
}

/// Highest trend score first. Records without a score are left out.
pub fn most_trending(records: &[AssetRecord], limit: usize) -> Vec<AssetRecord> {
    let mut scored: Vec<(u32, &AssetRecord)> = records
        .iter()
        .filter_map(|r| r.trend_score.map(|score| (score, r)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    take_owned(scored.into_iter().map(|(_, r)| r).collect(), limit)
}

/// Records listed on `chain`, in snapshot order.
pub fn by_chain(records: &[AssetRecord], chain: &str) -> Vec<AssetRecord> {
    records
        .iter()
        .filter(|r| {
            r.chain
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(chain.trim()))
        })
        .cloned()
        .collect()
}

fn take_owned(sorted: Vec<&AssetRecord>, limit: usize) -> Vec<AssetRecord> {
    sorted.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingBoard {
    pub most_trending: Vec<AssetRecord>,
    pub top_gainers: Vec<AssetRecord>,
    pub top_losers: Vec<AssetRecord>,
}

impl TrendingBoard {
    /// `limit` overrides the per-board defaults when set.
    pub fn from_records(records: &[AssetRecord], limit: Option<usize>) -> Self {
        Self {
            most_trending: most_trending(records, limit.unwrap_or(DEFAULT_TRENDING_LIMIT)),
            top_gainers: top_gainers(records, limit.unwrap_or(DEFAULT_MOVERS_LIMIT)),
            top_losers: top_losers(records, limit.unwrap_or(DEFAULT_MOVERS_LIMIT)),
        }
    }
}
