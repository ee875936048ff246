use anyhow::Result;
use clap::{Parser, Subcommand};
use dashboard_ipc::{
    send_request, DashboardRequest, SubmitPrediction, ViewRequest, DEFAULT_SOCKET_PATH,
};
use market::{SortKey, TimeFilter};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DASHBOARD_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Status,
    /// Show the market table; given options stick for later views.
    View {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long)]
        time_filter: Option<TimeFilter>,
    },
    /// Star or unstar an asset.
    Watch { symbol: String },
    Trending {
        #[arg(long)]
        limit: Option<usize>,
    },
    Overview,
    /// Assets listed on one chain, e.g. the meme-coin tables.
    Chain { chain: String },
    Predictions { symbol: String },
    Predict {
        symbol: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        #[arg(long, default_value_t = 50)]
        confidence: u32,
        #[arg(long)]
        reasoning: String,
        #[arg(long)]
        author: Option<String>,
    },
    Vote { symbol: String, id: String },
}

impl Command {
    fn into_request(self) -> DashboardRequest {
        match self {
            Command::Status => DashboardRequest::Status,
            Command::View {
                search,
                sort,
                time_filter,
            } => DashboardRequest::View(ViewRequest {
                search_term: search,
                sort_key: sort,
                time_filter,
            }),
            Command::Watch { symbol } => DashboardRequest::ToggleWatchlist { symbol },
            Command::Trending { limit } => DashboardRequest::Trending { limit },
            Command::Overview => DashboardRequest::Overview,
            Command::Chain { chain } => DashboardRequest::Chain { chain },
            Command::Predictions { symbol } => DashboardRequest::Predictions { symbol },
            Command::Predict {
                symbol,
                price,
                timeframe,
                confidence,
                reasoning,
                author,
            } => DashboardRequest::SubmitPrediction(SubmitPrediction {
                symbol,
                author_name: author,
                predicted_price: price,
                timeframe_label: timeframe,
                reasoning,
                confidence_percent: confidence,
            }),
            Command::Vote { symbol, id } => DashboardRequest::Vote { symbol, id },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let req = cli.command.into_request();

    let resp = send_request(&cli.socket, &req).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(args: &[&str]) -> DashboardRequest {
        let argv = std::iter::once("marketctl").chain(args.iter().copied());
        Cli::parse_from(argv).command.into_request()
    }

    #[test]
    fn view_flags_map_to_optional_overrides() {
        assert_eq!(
            request(&["view", "--sort", "market-cap", "--time-filter", "1h"]),
            DashboardRequest::View(ViewRequest {
                search_term: None,
                sort_key: Some(SortKey::MarketCap),
                time_filter: Some(TimeFilter::OneHour),
            })
        );
        assert_eq!(
            request(&["view"]),
            DashboardRequest::View(ViewRequest::default())
        );
    }

    #[test]
    fn rejects_unknown_sort_key() {
        let err = Cli::try_parse_from(["marketctl", "view", "--sort", "supply"])
            .expect_err("supply is not sortable");
        assert!(err.to_string().contains("unknown sort key"));
    }

    #[test]
    fn predict_uses_form_defaults() {
        let req = request(&["predict", "BTC", "--price", "69000", "--reasoning", "breakout"]);
        assert_eq!(
            req,
            DashboardRequest::SubmitPrediction(SubmitPrediction {
                symbol: "BTC".into(),
                author_name: None,
                predicted_price: 69_000.0,
                timeframe_label: "1h".into(),
                reasoning: "breakout".into(),
                confidence_percent: 50,
            })
        );
    }

    #[test]
    fn watch_and_vote_forward_arguments() {
        assert_eq!(
            request(&["watch", "eth"]),
            DashboardRequest::ToggleWatchlist {
                symbol: "eth".into()
            }
        );
        assert_eq!(
            request(&["vote", "BTC", "abc-123"]),
            DashboardRequest::Vote {
                symbol: "BTC".into(),
                id: "abc-123".into()
            }
        );
    }
}
