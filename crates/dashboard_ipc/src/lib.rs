use anyhow::Result;
use market::{
    AnnotatedRecord, AssetRecord, MarketOverview, SortKey, TimeFilter, TrendingBoard,
    ViewParameters,
};
use predictions::{Outlook, PredictionEntry, Sentiment};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::info;

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/market_dashboard.sock";

/// Fields left as `None` keep the session's current value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub sort_key: Option<SortKey>,
    #[serde(default)]
    pub time_filter: Option<TimeFilter>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPrediction {
    pub symbol: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub predicted_price: f64,
    pub timeframe_label: String,
    pub reasoning: String,
    pub confidence_percent: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardRequest {
    Status,
    View(ViewRequest),
    ToggleWatchlist { symbol: String },
    Trending { limit: Option<usize> },
    Overview,
    Chain { chain: String },
    Predictions { symbol: String },
    SubmitPrediction(SubmitPrediction),
    Vote { symbol: String, id: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub run_id: String,
    pub source: String,
    pub asset_count: usize,
    pub prediction_count: usize,
    pub params: ViewParameters,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionView {
    #[serde(flatten)]
    pub entry: PredictionEntry,
    pub change_percent: f64,
    pub outlook: Outlook,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBoard {
    pub symbol: String,
    pub reference_price: f64,
    pub predictions: Vec<PredictionView>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardResponse {
    Status(SessionStatus),
    View(Vec<AnnotatedRecord>),
    Records(Vec<AssetRecord>),
    Trending(TrendingBoard),
    Overview(MarketOverview),
    Predictions(PredictionBoard),
    Prediction(PredictionEntry),
    Watchlist(Vec<String>),
    Error(String),
}

pub async fn run_server<F>(socket_path: &str, handler: F) -> Result<()>
where
    F: Fn(DashboardRequest) -> Result<DashboardResponse> + Send + Sync + 'static,
{
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    let handler = std::sync::Arc::new(handler);
    info!(socket = socket_path, "dashboard ipc listening");
    loop {
        let (stream, _) = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_stream(stream, handler).await {
                tracing::warn!(error = ?err, "dashboard ipc handler error");
            }
        });
    }
}

async fn handle_stream<F>(stream: UnixStream, handler: std::sync::Arc<F>) -> Result<()>
where
    F: Fn(DashboardRequest) -> Result<DashboardResponse> + Send + Sync + 'static,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }
    let resp = match serde_json::from_str::<DashboardRequest>(buf.trim()) {
        Ok(req) => handler(req).unwrap_or_else(|err| DashboardResponse::Error(err.to_string())),
        Err(err) => DashboardResponse::Error(format!("malformed request: {err}")),
    };
    let line = serde_json::to_string(&resp)? + "\n";
    write_half.write_all(line.as_bytes()).await?;
    Ok(())
}

pub async fn send_request(socket_path: &str, req: &DashboardRequest) -> Result<DashboardResponse> {
    let mut stream = UnixStream::connect(socket_path).await?;
    let line = serde_json::to_string(req)? + "\n";
    stream.write_all(line.as_bytes()).await?;
    let (read_half, _) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = String::new();
    let _ = reader.read_line(&mut buf).await?;
    let resp: DashboardResponse = serde_json::from_str(buf.trim())?;
    Ok(resp)
}
