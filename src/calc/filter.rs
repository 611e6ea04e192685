use crate::calc::completion::is_route_completed;
use crate::data::Route;
use chrono::{DateTime, Utc};

/// Case-insensitive substring match over "code driver vehicle".
/// An empty query matches every route.
pub fn matches_query(route: &Route, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    route
        .search_text()
        .to_lowercase()
        .contains(&query.to_lowercase())
}

/// Routes matching the text query, in cache order.
pub fn search_routes<'a>(routes: &'a [Route], query: &str) -> Vec<&'a Route> {
    routes.iter().filter(|r| matches_query(r, query)).collect()
}

/// Text filter AND completion filter: keeps a route when its verdict equals
/// `show_completed`. Always returns a fresh sequence in cache order.
pub fn filter_routes<'a>(
    routes: &'a [Route],
    query: &str,
    show_completed: bool,
    now: DateTime<Utc>,
) -> Vec<&'a Route> {
    search_routes(routes, query)
        .into_iter()
        .filter(|r| is_route_completed(r, now) == show_completed)
        .collect()
}
