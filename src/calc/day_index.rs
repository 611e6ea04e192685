use crate::calc::completion::is_route_completed;
use crate::data::Route;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

/// Markers drawn per state in a calendar cell before switching to `+N`.
pub const MAX_MARKERS: usize = 3;

/// Calendar day a route belongs to, in the viewer's time zone.
pub fn day_key<Tz: TimeZone>(start: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    start.with_timezone(tz).date_naive()
}

/// Routes bucketed by start day. Each bucket keeps the order of the input.
#[derive(Debug, Default)]
pub struct RouteDayIndex<'a> {
    buckets: HashMap<NaiveDate, Vec<&'a Route>>,
}

impl<'a> RouteDayIndex<'a> {
    pub fn build<Tz: TimeZone>(routes: &[&'a Route], tz: &Tz) -> Self {
        let mut buckets: HashMap<NaiveDate, Vec<&'a Route>> = HashMap::new();
        for route in routes {
            buckets.entry(day_key(route.start, tz)).or_default().push(*route);
        }
        RouteDayIndex { buckets }
    }

    /// Empty slice for days without routes.
    pub fn routes_on(&self, day: NaiveDate) -> &[&'a Route] {
        self.buckets.get(&day).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Total number of routes across all buckets.
    pub fn route_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Pending/completed tally for one calendar cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySummary {
    pub pending: usize,
    pub completed: usize,
}

impl DaySummary {
    pub fn of(routes: &[&Route], now: DateTime<Utc>) -> Self {
        let completed = routes.iter().filter(|r| is_route_completed(r, now)).count();
        DaySummary {
            pending: routes.len() - completed,
            completed,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.completed
    }

    pub fn pending_markers(&self) -> usize {
        self.pending.min(MAX_MARKERS)
    }

    pub fn completed_markers(&self) -> usize {
        self.completed.min(MAX_MARKERS)
    }

    /// Count shown as `+N` once a day holds more routes than both marker rows.
    pub fn overflow(&self) -> Option<usize> {
        let shown = 2 * MAX_MARKERS;
        (self.total() > shown).then(|| self.total() - shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Id;
    use chrono::FixedOffset;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn route(id: &str, start: &str) -> Route {
        Route {
            id: Id::from(id),
            code: format!("R-{id}"),
            driver: String::new(),
            vehicle: String::new(),
            start: DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc),
            stops: vec![],
            status: None,
            completed_at: None,
        }
    }

    fn ids(routes: &[&Route]) -> Vec<String> {
        routes.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_buckets_by_day_in_input_order() {
        let routes = vec![
            route("a", "2024-03-15T18:00:00Z"),
            route("b", "2024-03-14T09:00:00Z"),
            route("c", "2024-03-15T07:00:00Z"),
        ];
        let refs: Vec<&Route> = routes.iter().collect();
        let index = RouteDayIndex::build(&refs, &Utc);
        // not resorted by time: "a" stays ahead of "c"
        assert_eq!(ids(index.routes_on(d(2024, 3, 15))), vec!["a", "c"]);
        assert_eq!(ids(index.routes_on(d(2024, 3, 14))), vec!["b"]);
        assert!(index.routes_on(d(2024, 3, 16)).is_empty());
    }

    #[test]
    fn test_union_of_buckets_is_input_exactly_once() {
        let routes = vec![
            route("1", "2024-03-01T08:00:00Z"),
            route("2", "2024-03-01T23:59:59Z"),
            route("3", "2024-03-02T00:00:00Z"),
            route("4", "2024-04-10T12:00:00Z"),
        ];
        let refs: Vec<&Route> = routes.iter().collect();
        let index = RouteDayIndex::build(&refs, &Utc);
        assert_eq!(index.route_count(), routes.len());
        let mut seen: Vec<String> = [d(2024, 3, 1), d(2024, 3, 2), d(2024, 4, 10)]
            .into_iter()
            .flat_map(|day| ids(index.routes_on(day)))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_day_key_uses_viewer_time_zone() {
        let late_utc = route("x", "2024-03-15T23:30:00Z");
        let madrid = FixedOffset::east_opt(3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();
        assert_eq!(day_key(late_utc.start, &Utc), d(2024, 3, 15));
        assert_eq!(day_key(late_utc.start, &madrid), d(2024, 3, 16));
        assert_eq!(day_key(late_utc.start, &new_york), d(2024, 3, 15));
    }

    #[test]
    fn test_empty_input_builds_empty_index() {
        let index = RouteDayIndex::build(&[], &Utc);
        assert_eq!(index.route_count(), 0);
        assert!(index.routes_on(d(2024, 3, 15)).is_empty());
    }

    #[test]
    fn test_day_summary_counts_and_markers() {
        let now = DateTime::parse_from_rfc3339("2024-03-15T20:00:00Z").unwrap().with_timezone(&Utc);
        let mut routes: Vec<Route> = (0..5).map(|i| route(&format!("p{i}"), "2024-03-15T19:00:00Z")).collect();
        for i in 0..4 {
            let mut r = route(&format!("c{i}"), "2024-03-15T08:00:00Z");
            r.status = Some(json!("COMPLETED"));
            routes.push(r);
        }
        let refs: Vec<&Route> = routes.iter().collect();
        let summary = DaySummary::of(&refs, now);
        assert_eq!(summary, DaySummary { pending: 5, completed: 4 });
        assert_eq!(summary.pending_markers(), 3);
        assert_eq!(summary.completed_markers(), 3);
        assert_eq!(summary.overflow(), Some(3));
    }

    #[test]
    fn test_day_summary_without_overflow() {
        let summary = DaySummary { pending: 4, completed: 2 };
        assert_eq!(summary.overflow(), None);
        assert_eq!(DaySummary::default().total(), 0);
    }
}
