use serde::{Deserialize, Serialize};

use crate::record::AssetRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    pub symbol: String,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dominance {
    pub symbol: String,
    pub percent: f64,
}

/// Headline figures for the landing and market-cap pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub asset_count: usize,
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
    pub top_gainer: Option<Mover>,
    pub top_loser: Option<Mover>,
    pub dominance: Option<Dominance>,
}

impl MarketOverview {
    pub fn from_records(records: &[AssetRecord], dominance_symbol: &str) -> Self {
        let total_market_cap: f64 = records.iter().map(|r| r.market_cap).sum();
        let total_volume: f64 = records.iter().map(|r| r.volume).sum();
        let gainers = records.iter().filter(|r| r.change_percent > 0.0).count();
        let losers = records.iter().filter(|r| r.change_percent < 0.0).count();

        let top_gainer = records
            .iter()
            .max_by(|a, b| a.change_percent.total_cmp(&b.change_percent))
            .map(mover);
        let top_loser = records
            .iter()
            .min_by(|a, b| a.change_percent.total_cmp(&b.change_percent))
            .map(mover);

        let dominance = records
            .iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(dominance_symbol))
            .filter(|_| total_market_cap > 0.0)
            .map(|r| Dominance {
                symbol: r.symbol.clone(),
                percent: r.market_cap / total_market_cap * 100.0,
            });

        Self {
            asset_count: records.len(),
            total_market_cap,
            total_volume,
            gainers,
            losers,
            unchanged: records.len() - gainers - losers,
            top_gainer,
            top_loser,
            dominance,
        }
    }
}

fn mover(record: &AssetRecord) -> Mover {
    Mover {
        symbol: record.symbol.clone(),
        change_percent: record.change_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_totals_movers_and_dominance() {
        let records = vec![
            AssetRecord::new("BTC", "Bitcoin", 60_000.0, 2.0, 30.0, 600.0),
            AssetRecord::new("ETH", "Ethereum", 3_000.0, -1.0, 15.0, 300.0),
            AssetRecord::new("USDT", "Tether", 1.0, 0.0, 55.0, 100.0),
        ];
        let overview = MarketOverview::from_records(&records, "btc");

        assert_eq!(overview.asset_count, 3);
        assert_eq!(overview.total_market_cap, 1000.0);
        assert_eq!(overview.total_volume, 100.0);
        assert_eq!((overview.gainers, overview.losers, overview.unchanged), (1, 1, 1));
        assert_eq!(overview.top_gainer.map(|m| m.symbol).as_deref(), Some("BTC"));
        assert_eq!(overview.top_loser.map(|m| m.symbol).as_deref(), Some("ETH"));

        let dominance = overview.dominance.expect("btc is present");
        assert_eq!(dominance.symbol, "BTC");
        assert!((dominance.percent - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_has_no_movers_or_dominance() {
        let overview = MarketOverview::from_records(&[], "BTC");
        assert_eq!(overview.asset_count, 0);
        assert_eq!(overview.total_market_cap, 0.0);
        assert!(overview.top_gainer.is_none());
        assert!(overview.top_loser.is_none());
        assert!(overview.dominance.is_none());
    }

    #[test]
    fn dominance_is_absent_for_unknown_symbol_or_zero_cap() {
        let records = vec![AssetRecord::new("ETH", "Ethereum", 3_000.0, 1.0, 0.0, 0.0)];
        assert!(MarketOverview::from_records(&records, "BTC").dominance.is_none());
        assert!(MarketOverview::from_records(&records, "ETH").dominance.is_none());
    }
}
