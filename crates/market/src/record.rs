use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("duplicate symbol `{0}` in snapshot")]
    DuplicateSymbol(String),
    #[error("{symbol}: invalid {field}: {reason}")]
    InvalidField {
        symbol: String,
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to read snapshot {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot json")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseKeyError {
    pub kind: &'static str,
    pub value: String,
}

/// Horizon whose change percent is displayed next to each asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFilter {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 7] = [
        TimeFilter::OneMinute,
        TimeFilter::FiveMinutes,
        TimeFilter::FifteenMinutes,
        TimeFilter::OneHour,
        TimeFilter::SixHours,
        TimeFilter::TwelveHours,
        TimeFilter::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::OneMinute => "1m",
            TimeFilter::FiveMinutes => "5m",
            TimeFilter::FifteenMinutes => "15m",
            TimeFilter::OneHour => "1h",
            TimeFilter::SixHours => "6h",
            TimeFilter::TwelveHours => "12h",
            TimeFilter::OneDay => "24h",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TimeFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| ParseKeyError {
                kind: "time filter",
                value: s.to_string(),
            })
    }
}

/// Change percents for the short horizons. Each one is an independent input;
/// the 24h figure lives on [`AssetRecord::change_percent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonChanges {
    #[serde(rename = "1m", default, skip_serializing_if = "Option::is_none")]
    pub one_minute: Option<f64>,
    #[serde(rename = "5m", default, skip_serializing_if = "Option::is_none")]
    pub five_minutes: Option<f64>,
    #[serde(rename = "15m", default, skip_serializing_if = "Option::is_none")]
    pub fifteen_minutes: Option<f64>,
    #[serde(rename = "1h", default, skip_serializing_if = "Option::is_none")]
    pub one_hour: Option<f64>,
    #[serde(rename = "6h", default, skip_serializing_if = "Option::is_none")]
    pub six_hours: Option<f64>,
    #[serde(rename = "12h", default, skip_serializing_if = "Option::is_none")]
    pub twelve_hours: Option<f64>,
}

impl HorizonChanges {
    /// Returns `None` for [`TimeFilter::OneDay`], which is not stored here.
    pub fn get(&self, filter: TimeFilter) -> Option<f64> {
        match filter {
            TimeFilter::OneMinute => self.one_minute,
            TimeFilter::FiveMinutes => self.five_minutes,
            TimeFilter::FifteenMinutes => self.fifteen_minutes,
            TimeFilter::OneHour => self.one_hour,
            TimeFilter::SixHours => self.six_hours,
            TimeFilter::TwelveHours => self.twelve_hours,
            TimeFilter::OneDay => None,
        }
    }

    pub fn set(&mut self, filter: TimeFilter, value: f64) {
        let slot = match filter {
            TimeFilter::OneMinute => &mut self.one_minute,
            TimeFilter::FiveMinutes => &mut self.five_minutes,
            TimeFilter::FifteenMinutes => &mut self.fifteen_minutes,
            TimeFilter::OneHour => &mut self.one_hour,
            TimeFilter::SixHours => &mut self.six_hours,
            TimeFilter::TwelveHours => &mut self.twelve_hours,
            TimeFilter::OneDay => return,
        };
        *slot = Some(value);
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        TimeFilter::ALL.into_iter().filter_map(move |filter| self.get(filter))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: f64,
    #[serde(default)]
    pub horizon_changes: HorizonChanges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

impl AssetRecord {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        change_percent: f64,
        volume: f64,
        market_cap: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price,
            change_percent,
            volume,
            market_cap,
            horizon_changes: HorizonChanges::default(),
            trend_score: None,
            chain: None,
        }
    }

    pub fn with_trend_score(mut self, score: u32) -> Self {
        self.trend_score = Some(score);
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    pub fn with_horizon_change(mut self, filter: TimeFilter, value: f64) -> Self {
        self.horizon_changes.set(filter, value);
        self
    }

    pub fn change_for(&self, filter: TimeFilter) -> Option<f64> {
        match filter {
            TimeFilter::OneDay => Some(self.change_percent),
            other => self.horizon_changes.get(other),
        }
    }

    pub fn is_gainer(&self) -> bool {
        self.change_percent >= 0.0
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        let invalid = |field: &'static str, reason: &'static str| SnapshotError::InvalidField {
            symbol: self.symbol.clone(),
            field,
            reason,
        };

        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }
        if self.symbol != self.symbol.trim().to_uppercase() {
            return Err(invalid("symbol", "must be an uppercase ticker"));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(invalid("price", "must be a positive number"));
        }
        if !self.change_percent.is_finite() {
            return Err(invalid("changePercent", "must be finite"));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(invalid("volume", "must be a non-negative number"));
        }
        if !self.market_cap.is_finite() || self.market_cap < 0.0 {
            return Err(invalid("marketCap", "must be a non-negative number"));
        }
        if self.horizon_changes.values().any(|v| !v.is_finite()) {
            return Err(invalid("horizonChanges", "must be finite"));
        }
        Ok(())
    }
}

/// Ordered set of records captured at one point in time. Symbols are unique
/// uppercase tickers and every numeric field is finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    records: Vec<AssetRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<AssetRecord>) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            record.validate()?;
            if !seen.insert(record.symbol.as_str()) {
                return Err(SnapshotError::DuplicateSymbol(record.symbol.clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn get(&self, symbol: &str) -> Option<&AssetRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
