use std::collections::BTreeSet;

/// Symbols the user starred. Ordered so serialized output is stable.
pub type Watchlist = BTreeSet<String>;

/// Returns a copy of `watchlist` with `symbol` flipped in or out.
pub fn toggle_watchlist(watchlist: &Watchlist, symbol: &str) -> Watchlist {
    let mut next = watchlist.clone();
    if !next.remove(symbol) {
        next.insert(symbol.to_string());
    }
    next
}
