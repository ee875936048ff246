use std::collections::HashMap;

use dashboard_ipc::{
    DashboardRequest, DashboardResponse, PredictionBoard, PredictionView, SessionStatus,
    SubmitPrediction, ViewRequest,
};
use market::{
    by_chain, derive_view, toggle_watchlist, AssetRecord, MarketOverview, Snapshot,
    TrendingBoard, ViewParameters,
};
use predictions::{trend_direction, Outlook, PredictionDraft, PredictionError, PredictionLedger};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown asset `{0}`")]
    UnknownAsset(String),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// All state for one dashboard session. Requests are applied one at a time
/// and a rejected request changes nothing.
pub struct Session {
    run_id: String,
    source: String,
    snapshot: Snapshot,
    params: ViewParameters,
    ledgers: HashMap<String, PredictionLedger>,
    dominance_symbol: String,
}

impl Session {
    pub fn new(
        run_id: impl Into<String>,
        source: impl Into<String>,
        snapshot: Snapshot,
        dominance_symbol: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            source: source.into(),
            snapshot,
            params: ViewParameters::default(),
            ledgers: HashMap::new(),
            dominance_symbol: dominance_symbol.into(),
        }
    }

    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    pub fn handle(&mut self, req: DashboardRequest) -> DashboardResponse {
        match self.apply(req) {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "request rejected");
                DashboardResponse::Error(err.to_string())
            }
        }
    }

    fn apply(&mut self, req: DashboardRequest) -> Result<DashboardResponse, SessionError> {
        debug!(request = ?req, "applying request");
        let resp = match req {
            DashboardRequest::Status => DashboardResponse::Status(self.status()),
            DashboardRequest::View(view) => {
                self.update_params(view);
                DashboardResponse::View(derive_view(self.snapshot.records(), &self.params))
            }
            DashboardRequest::ToggleWatchlist { symbol } => {
                let symbol = normalize_symbol(&symbol);
                self.params.watchlist = toggle_watchlist(&self.params.watchlist, &symbol);
                DashboardResponse::Watchlist(self.params.watchlist.iter().cloned().collect())
            }
            DashboardRequest::Trending { limit } => DashboardResponse::Trending(
                TrendingBoard::from_records(self.snapshot.records(), limit),
            ),
            DashboardRequest::Overview => DashboardResponse::Overview(
                MarketOverview::from_records(self.snapshot.records(), &self.dominance_symbol),
            ),
            DashboardRequest::Chain { chain } => {
                DashboardResponse::Records(by_chain(self.snapshot.records(), &chain))
            }
            DashboardRequest::Predictions { symbol } => {
                DashboardResponse::Predictions(self.prediction_board(&symbol)?)
            }
            DashboardRequest::SubmitPrediction(submission) => {
                DashboardResponse::Prediction(self.submit(submission)?)
            }
            DashboardRequest::Vote { symbol, id } => {
                let symbol = normalize_symbol(&symbol);
                self.asset(&symbol)?;
                let entry = self
                    .ledgers
                    .get_mut(&symbol)
                    .ok_or_else(|| PredictionError::NotFound(id.clone()))?
                    .vote(&id)?;
                DashboardResponse::Prediction(entry)
            }
        };
        Ok(resp)
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            run_id: self.run_id.clone(),
            source: self.source.clone(),
            asset_count: self.snapshot.len(),
            prediction_count: self.ledgers.values().map(PredictionLedger::len).sum(),
            params: self.params.clone(),
        }
    }

    fn update_params(&mut self, view: ViewRequest) {
        if let Some(term) = view.search_term {
            self.params.search_term = term;
        }
        if let Some(key) = view.sort_key {
            self.params.sort_key = key;
        }
        if let Some(filter) = view.time_filter {
            self.params.time_filter = filter;
        }
    }

    fn asset(&self, symbol: &str) -> Result<&AssetRecord, SessionError> {
        self.snapshot
            .get(symbol)
            .ok_or_else(|| SessionError::UnknownAsset(symbol.to_string()))
    }

    fn prediction_board(&self, symbol: &str) -> Result<PredictionBoard, SessionError> {
        let symbol = normalize_symbol(symbol);
        let reference_price = self.asset(&symbol)?.price;
        let empty = PredictionLedger::new();
        let ledger = self.ledgers.get(&symbol).unwrap_or(&empty);

        let predictions = ledger
            .entries()
            .iter()
            .map(|entry| {
                let change_percent = trend_direction(entry, reference_price);
                PredictionView {
                    entry: entry.clone(),
                    change_percent,
                    outlook: Outlook::from_change(change_percent),
                }
            })
            .collect();

        Ok(PredictionBoard {
            sentiment: ledger.sentiment(reference_price),
            symbol,
            reference_price,
            predictions,
        })
    }

    fn submit(
        &mut self,
        submission: SubmitPrediction,
    ) -> Result<predictions::PredictionEntry, SessionError> {
        let symbol = normalize_symbol(&submission.symbol);
        self.asset(&symbol)?;

        let draft = PredictionDraft {
            author_name: submission.author_name,
            predicted_price: submission.predicted_price,
            timeframe_label: submission.timeframe_label,
            reasoning: submission.reasoning,
            confidence_percent: submission.confidence_percent,
        };
        let ledger = self.ledgers.entry(symbol).or_default();
        Ok(ledger.submit(draft)?)
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
