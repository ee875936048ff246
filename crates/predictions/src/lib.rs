use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Timeframes offered by the prediction form.
pub const TIMEFRAME_LABELS: [&str; 6] = ["30m", "1h", "2h", "4h", "12h", "24h"];

pub const DEFAULT_AUTHOR: &str = "You";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictionError {
    #[error("invalid prediction: {0}")]
    Validation(String),
    #[error("prediction `{0}` not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDraft {
    #[serde(default)]
    pub author_name: Option<String>,
    pub predicted_price: f64,
    pub timeframe_label: String,
    pub reasoning: String,
    pub confidence_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionEntry {
    pub id: String,
    pub author_name: String,
    pub predicted_price: f64,
    pub timeframe_label: String,
    pub reasoning: String,
    pub confidence_percent: u32,
    pub created_at: DateTime<Utc>,
    pub vote_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Bullish,
    Bearish,
}

impl Outlook {
    /// A prediction at exactly the reference price reads as bearish.
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent > 0.0 {
            Outlook::Bullish
        } else {
            Outlook::Bearish
        }
    }
}

/// Percent distance from `reference_price`, which must be positive.
pub fn trend_direction(entry: &PredictionEntry, reference_price: f64) -> f64 {
    (entry.predicted_price - reference_price) / reference_price * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    pub count: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub mean_predicted_price: Option<f64>,
    pub mean_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionLedger {
    entries: Vec<PredictionEntry>,
}

impl PredictionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PredictionEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&PredictionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn submit(&mut self, draft: PredictionDraft) -> Result<PredictionEntry, PredictionError> {
        self.submit_at(draft, Utc::now())
    }

    pub fn submit_at(
        &mut self,
        draft: PredictionDraft,
        now: DateTime<Utc>,
    ) -> Result<PredictionEntry, PredictionError> {
        validate(&draft)?;

        let author_name = draft
            .author_name
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
        let entry = PredictionEntry {
            id: Uuid::new_v4().to_string(),
            author_name,
            predicted_price: draft.predicted_price,
            timeframe_label: draft.timeframe_label,
            reasoning: draft.reasoning.trim().to_string(),
            confidence_percent: draft.confidence_percent,
            created_at: now,
            vote_count: 0,
        };
        self.entries.insert(0, entry.clone());
        Ok(entry)
    }

    pub fn vote(&mut self, id: &str) -> Result<PredictionEntry, PredictionError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| PredictionError::NotFound(id.to_string()))?;
        entry.vote_count += 1;
        Ok(entry.clone())
    }

    pub fn sentiment(&self, reference_price: f64) -> Sentiment {
        let count = self.entries.len();
        let bullish = self
            .entries
            .iter()
            .filter(|e| Outlook::from_change(trend_direction(e, reference_price)) == Outlook::Bullish)
            .count();

        let mean_predicted_price = (count > 0).then(|| {
            self.entries.iter().map(|e| e.predicted_price).sum::<f64>() / count as f64
        });

        // Each entry weighs 1 + votes so unvoted predictions still count.
        let weight_total: f64 = self.entries.iter().map(|e| 1.0 + e.vote_count as f64).sum();
        let mean_confidence = (count > 0).then(|| {
            self.entries
                .iter()
                .map(|e| (1.0 + e.vote_count as f64) * f64::from(e.confidence_percent))
                .sum::<f64>()
                / weight_total
        });

        Sentiment {
            count,
            bullish,
            bearish: count - bullish,
            mean_predicted_price,
            mean_confidence,
        }
    }
}

// Also rejects timeframes outside TIMEFRAME_LABELS and blank author names.
fn validate(draft: &PredictionDraft) -> Result<(), PredictionError> {
    let invalid = |msg: &str| Err(PredictionError::Validation(msg.to_string()));

    if draft.reasoning.trim().is_empty() {
        return invalid("reasoning must not be empty");
    }
    if !(1..=100).contains(&draft.confidence_percent) {
        return invalid("confidence must be between 1 and 100");
    }
    if !draft.predicted_price.is_finite() || draft.predicted_price <= 0.0 {
        return invalid("predicted price must be positive");
    }
    if !TIMEFRAME_LABELS.contains(&draft.timeframe_label.as_str()) {
        return invalid("unsupported timeframe");
    }
    if draft
        .author_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return invalid("author name must not be blank");
    }
    Ok(())
}
