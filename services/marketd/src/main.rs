use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail};
use clap::Parser;
use dashboard_ipc::{run_server, DashboardRequest, DashboardResponse, DEFAULT_SOCKET_PATH};
use market::{JsonFileSource, SnapshotSource};
use metrics::MetricsHandle;
use tokio::task;
use tracing::{info, Level};
use uuid::Uuid;

mod session;

use session::Session;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "SNAPSHOT_PATH", default_value = "data/sample_snapshot.json")]
    snapshot_path: String,

    #[arg(long, env = "DASHBOARD_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    dashboard_socket: String,

    #[arg(long, env = "METRICS_ADDR", default_value = "127.0.0.1:9110")]
    metrics_addr: SocketAddr,

    #[arg(long, env = "DOMINANCE_SYMBOL", default_value = "BTC")]
    dominance_symbol: String,
}

fn log_startup(args: &Args, run_id: &str, asset_count: usize) {
    info!(path = %args.snapshot_path, assets = asset_count, "snapshot source configured");
    info!(socket = %args.dashboard_socket, "dashboard socket bind planned");
    info!(addr = %args.metrics_addr, "metrics bind planned");
    info!(symbol = %args.dominance_symbol, "dominance symbol selected");
    info!(%run_id, "session initialized");
}

fn validate_snapshot_path(path: &str) -> anyhow::Result<()> {
    if path.trim().is_empty() {
        bail!("snapshot path must not be empty");
    }
    if !path.to_ascii_lowercase().ends_with(".json") {
        bail!("snapshot path must point at a `.json` file");
    }
    Ok(())
}

fn record_outcome(metrics: &MetricsHandle, req: &DashboardRequest, resp: &DashboardResponse) {
    metrics.requests().inc();
    if matches!(resp, DashboardResponse::Error(_)) {
        metrics.request_errors().inc();
        return;
    }
    match req {
        DashboardRequest::SubmitPrediction(_) => metrics.predictions_submitted().inc(),
        DashboardRequest::Vote { .. } => metrics.votes().inc(),
        DashboardRequest::ToggleWatchlist { .. } => metrics.watchlist_toggles().inc(),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    validate_snapshot_path(&args.snapshot_path)?;
    info!(
        snapshot = %args.snapshot_path,
        socket = %args.dashboard_socket,
        "booting marketd"
    );

    let run_id = Uuid::new_v4().to_string();
    let source = JsonFileSource::new(&args.snapshot_path);
    let snapshot = source.load()?;
    log_startup(&args, &run_id, snapshot.len());

    let session = Arc::new(Mutex::new(Session::new(
        run_id.clone(),
        source.describe(),
        snapshot,
        args.dominance_symbol.clone(),
    )));

    let metrics = MetricsHandle::new()?;
    let metrics_addr = args.metrics_addr;
    let metrics_task = metrics.clone();
    task::spawn(async move {
        if let Err(err) = metrics_task.serve(metrics_addr).await {
            tracing::error!(error = ?err, "metrics server error");
        }
    });

    let socket_path = args.dashboard_socket.clone();
    let handler = move |req: DashboardRequest| -> anyhow::Result<DashboardResponse> {
        let mut session = session.lock().map_err(|_| anyhow!("session state poisoned"))?;
        let resp = session.handle(req.clone());
        record_outcome(&metrics, &req, &resp);
        Ok(resp)
    };
    let server = task::spawn(async move { run_server(&socket_path, handler).await });

    info!(
        run_id = %run_id,
        snapshot = %args.snapshot_path,
        dashboard_socket = %args.dashboard_socket,
        metrics_addr = %args.metrics_addr,
        "ready"
    );

    tokio::select! {
        joined = server => {
            joined??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(run_id = %run_id, "shutdown requested");
        }
    }

    let _ = std::fs::remove_file(&args.dashboard_socket);
    Ok(())
}
