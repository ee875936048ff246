pub mod overview;
pub mod record;
pub mod source;
pub mod trending;
pub mod view;
pub mod watchlist;

pub use overview::{Dominance, MarketOverview, Mover};
pub use record::{AssetRecord, HorizonChanges, ParseKeyError, Snapshot, SnapshotError, TimeFilter};
pub use source::{parse_snapshot, JsonFileSource, SnapshotSource, StaticSource};
pub use trending::{by_chain, most_trending, top_gainers, top_losers, TrendingBoard};
pub use view::{derive_view, AnnotatedRecord, SortKey, ViewParameters};
pub use watchlist::{toggle_watchlist, Watchlist};
