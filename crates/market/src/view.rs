use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::{AssetRecord, ParseKeyError, TimeFilter};
use crate::watchlist::Watchlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Input order of the snapshot.
    Rank,
    #[default]
    MarketCap,
    Price,
    Change,
    Volume,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Rank => "rank",
            SortKey::MarketCap => "marketCap",
            SortKey::Price => "price",
            SortKey::Change => "change",
            SortKey::Volume => "volume",
        }
    }

    /// Field compared for this key; `None` for [`SortKey::Rank`].
    pub fn sort_value(&self, record: &AssetRecord) -> Option<f64> {
        match self {
            SortKey::Rank => None,
            SortKey::MarketCap => Some(record.market_cap),
            SortKey::Price => Some(record.price),
            SortKey::Change => Some(record.change_percent),
            SortKey::Volume => Some(record.volume),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "rank" => Ok(SortKey::Rank),
            "marketcap" => Ok(SortKey::MarketCap),
            "price" => Ok(SortKey::Price),
            "change" => Ok(SortKey::Change),
            "volume" => Ok(SortKey::Volume),
            _ => Err(ParseKeyError {
                kind: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParameters {
    pub search_term: String,
    pub sort_key: SortKey,
    pub time_filter: TimeFilter,
    pub watchlist: Watchlist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: AssetRecord,
    pub rank: usize,
    pub is_gainer: bool,
    pub is_watchlisted: bool,
    pub displayed_change: Option<f64>,
}

/// Filters, sorts and annotates `records` for display. Ties keep input order.
pub fn derive_view(records: &[AssetRecord], params: &ViewParameters) -> Vec<AnnotatedRecord> {
    let needle = params.search_term.to_lowercase();
    let mut rows: Vec<&AssetRecord> = records
        .iter()
        .filter(|record| matches_search(record, &needle))
        .collect();

    let key = params.sort_key;
    if key != SortKey::Rank {
        rows.sort_by(|a, b| {
            let lhs = key.sort_value(a).unwrap_or_default();
            let rhs = key.sort_value(b).unwrap_or_default();
            rhs.total_cmp(&lhs)
        });
    }

    rows.into_iter()
        .enumerate()
        .map(|(idx, record)| AnnotatedRecord {
            rank: idx + 1,
            is_gainer: record.is_gainer(),
            is_watchlisted: params.watchlist.contains(&record.symbol),
            displayed_change: record.change_for(params.time_filter),
            record: record.clone(),
        })
        .collect()
}

fn matches_search(record: &AssetRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.symbol.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchlist::toggle_watchlist;

    fn sample() -> Vec<AssetRecord> {
        vec![
            AssetRecord::new("BTC", "Bitcoin", 60_000.0, 2.0, 28e9, 1.18e12),
            AssetRecord::new("ETH", "Ethereum", 3_000.0, -1.0, 14e9, 3.6e11)
                .with_horizon_change(TimeFilter::OneHour, 0.3),
            AssetRecord::new("SOL", "Solana", 145.0, 5.5, 3e9, 6.5e10),
            AssetRecord::new("DOGE", "Dogecoin", 0.078, 5.2, 8.9e8, 1.12e10),
            AssetRecord::new("PEPE", "Pepe", 0.0000012, 18.9, 1.2e9, 5.1e9),
        ]
    }

    fn symbols(rows: &[AnnotatedRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.record.symbol.as_str()).collect()
    }

    #[test]
    fn sorts_by_change_and_flags_gainers() {
        let records = vec![
            AssetRecord::new("BTC", "Bitcoin", 60_000.0, 2.0, 1.0, 1.0),
            AssetRecord::new("ETH", "Ethereum", 3_000.0, -1.0, 1.0, 1.0),
        ];
        let params = ViewParameters {
            sort_key: SortKey::Change,
            ..ViewParameters::default()
        };

        let rows = derive_view(&records, &params);
        assert_eq!(symbols(&rows), ["BTC", "ETH"]);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(
            rows.iter().map(|r| r.is_gainer).collect::<Vec<_>>(),
            [true, false]
        );
    }

    #[test]
    fn each_numeric_key_sorts_non_increasing() {
        let records = sample();
        let keys = [
            SortKey::MarketCap,
            SortKey::Price,
            SortKey::Change,
            SortKey::Volume,
        ];
        for key in keys {
            let params = ViewParameters {
                sort_key: key,
                ..ViewParameters::default()
            };
            let rows = derive_view(&records, &params);
            assert!(
                rows.windows(2)
                    .all(|w| key.sort_value(&w[0].record) >= key.sort_value(&w[1].record)),
                "{key} should be non-increasing"
            );
            assert_eq!(rows.len(), records.len());
        }
    }

    #[test]
    fn rank_key_keeps_snapshot_order() {
        let records = sample();
        let params = ViewParameters {
            sort_key: SortKey::Rank,
            ..ViewParameters::default()
        };
        let rows = derive_view(&records, &params);
        assert_eq!(symbols(&rows), ["BTC", "ETH", "SOL", "DOGE", "PEPE"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            AssetRecord::new("AAA", "First", 1.0, 0.0, 10.0, 5.0),
            AssetRecord::new("BBB", "Second", 1.0, 0.0, 10.0, 5.0),
            AssetRecord::new("CCC", "Third", 1.0, 0.0, 20.0, 5.0),
        ];
        let params = ViewParameters {
            sort_key: SortKey::Volume,
            ..ViewParameters::default()
        };
        assert_eq!(symbols(&derive_view(&records, &params)), ["CCC", "AAA", "BBB"]);
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_symbol() {
        let records = sample();
        let by_name = ViewParameters {
            search_term: "COIN".into(),
            sort_key: SortKey::Rank,
            ..ViewParameters::default()
        };
        assert_eq!(symbols(&derive_view(&records, &by_name)), ["BTC", "DOGE"]);

        let by_symbol = ViewParameters {
            search_term: "sol".into(),
            ..ViewParameters::default()
        };
        let rows = derive_view(&records, &by_symbol);
        assert_eq!(symbols(&rows), ["SOL"]);
        assert_eq!(rows[0].rank, 1);
    }

    #[test]
    fn no_match_and_empty_input_yield_empty_views() {
        let params = ViewParameters {
            search_term: "zzz".into(),
            ..ViewParameters::default()
        };
        assert!(derive_view(&sample(), &params).is_empty());
        assert!(derive_view(&[], &ViewParameters::default()).is_empty());
    }

    #[test]
    fn output_is_a_matching_subset_of_the_input() {
        let records = sample();
        let params = ViewParameters {
            search_term: "e".into(),
            sort_key: SortKey::Price,
            ..ViewParameters::default()
        };
        let rows = derive_view(&records, &params);
        assert!(rows.len() <= records.len());
        for row in &rows {
            assert!(records.iter().any(|r| r.symbol == row.record.symbol));
            assert!(matches_search(&row.record, "e"));
        }
    }

    #[test]
    fn derivation_is_repeatable() {
        let records = sample();
        let params = ViewParameters {
            search_term: "o".into(),
            sort_key: SortKey::Change,
            time_filter: TimeFilter::OneHour,
            watchlist: toggle_watchlist(&Watchlist::new(), "ETH"),
        };
        assert_eq!(derive_view(&records, &params), derive_view(&records, &params));
    }

    #[test]
    fn annotates_watchlist_and_displayed_change() {
        let records = sample();
        let params = ViewParameters {
            sort_key: SortKey::Rank,
            time_filter: TimeFilter::OneHour,
            watchlist: toggle_watchlist(&Watchlist::new(), "ETH"),
            ..ViewParameters::default()
        };
        let rows = derive_view(&records, &params);
        assert!(!rows[0].is_watchlisted);
        assert!(rows[1].is_watchlisted);
        assert_eq!(rows[0].displayed_change, None);
        assert_eq!(rows[1].displayed_change, Some(0.3));
    }

    #[test]
    fn nan_fields_do_not_panic() {
        let mut records = sample();
        records[2].price = f64::NAN;
        let params = ViewParameters {
            sort_key: SortKey::Price,
            ..ViewParameters::default()
        };
        assert_eq!(derive_view(&records, &params).len(), records.len());
    }

    #[test]
    fn parses_sort_keys_in_several_spellings() {
        assert_eq!("marketCap".parse::<SortKey>(), Ok(SortKey::MarketCap));
        assert_eq!("market_cap".parse::<SortKey>(), Ok(SortKey::MarketCap));
        assert_eq!("market-cap".parse::<SortKey>(), Ok(SortKey::MarketCap));
        assert_eq!("Volume".parse::<SortKey>(), Ok(SortKey::Volume));
        assert!("supply".parse::<SortKey>().is_err());
    }

    #[test]
    fn flattens_record_fields_when_serialized() {
        let rows = derive_view(&sample()[..1], &ViewParameters::default());
        let value = serde_json::to_value(&rows[0]).expect("row should serialize");
        assert_eq!(value["symbol"], "BTC");
        assert_eq!(value["rank"], 1);
        assert_eq!(value["isGainer"], true);
        assert_eq!(value["displayedChange"], 2.0);
    }
}
