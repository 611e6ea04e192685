use crate::calc::{
    CalendarDay, DaySummary, RouteDayIndex, add_months, filter_routes, month_grid, month_label,
};
use crate::data::{DecodedRoutes, Id, Route};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Tag handed out when a route refresh starts. Only the newest ticket may
/// replace the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { routes: usize, rejected: usize },
    /// A newer refresh was issued after this one; the response was dropped.
    Stale,
}

/// One rendered calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub day: CalendarDay,
    pub summary: DaySummary,
    pub is_selected: bool,
    pub is_today: bool,
}

/// Everything the calendar screen draws, derived from `ScheduleState`.
#[derive(Debug)]
pub struct ScheduleView<'a> {
    pub month_label: String,
    pub cells: Vec<GridCell>,
    pub day_routes: Vec<&'a Route>,
    pub visible_routes: usize,
}

/// Route cache plus the cursors of the admin calendar.
///
/// `month_cursor` and `selected_date` move independently: selecting a filler
/// day from a neighbouring month does not scroll the grid, and month
/// navigation leaves the selection alone. Everything shown is recomputed
/// from these fields on demand.
#[derive(Debug)]
pub struct ScheduleState {
    routes: Vec<Route>,
    search: String,
    show_completed: bool,
    month_cursor: NaiveDate,
    selected_date: NaiveDate,
    last_ticket: u64,
    last_rejected: usize,
}

impl ScheduleState {
    pub fn new(today: NaiveDate) -> Self {
        ScheduleState {
            routes: Vec::new(),
            search: String::new(),
            show_completed: false,
            month_cursor: today,
            selected_date: today,
            last_ticket: 0,
            last_rejected: 0,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn show_completed(&self) -> bool {
        self.show_completed
    }

    pub fn month_cursor(&self) -> NaiveDate {
        self.month_cursor
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Records rejected by the last applied refresh.
    pub fn last_rejected(&self) -> usize {
        self.last_rejected
    }

    // ── navigation ────────────────────────────────────────────────────────────

    pub fn go_prev_month(&mut self) {
        self.month_cursor = add_months(self.month_cursor, -1);
    }

    pub fn go_next_month(&mut self) {
        self.month_cursor = add_months(self.month_cursor, 1);
    }

    pub fn go_today(&mut self, today: NaiveDate) {
        self.month_cursor = today;
        self.selected_date = today;
    }

    pub fn select_day(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    // ── filters ───────────────────────────────────────────────────────────────

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
    }

    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
    }

    // ── cache ─────────────────────────────────────────────────────────────────

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.last_ticket += 1;
        RefreshTicket(self.last_ticket)
    }

    /// False once a newer refresh has been issued.
    pub fn is_latest(&self, ticket: RefreshTicket) -> bool {
        ticket.0 == self.last_ticket
    }

    /// Replaces the cache wholesale unless a newer refresh has been issued.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, decoded: DecodedRoutes) -> RefreshOutcome {
        if !self.is_latest(ticket) {
            tracing::debug!(ticket = ticket.0, latest = self.last_ticket, "dropping stale refresh");
            return RefreshOutcome::Stale;
        }
        self.last_rejected = decoded.rejected.len();
        self.routes = decoded.routes;
        RefreshOutcome::Applied {
            routes: self.routes.len(),
            rejected: self.last_rejected,
        }
    }

    /// Local splice after a successful `DELETE /routes/:id`.
    pub fn remove_route(&mut self, id: &Id) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| &r.id != id);
        self.routes.len() != before
    }

    // ── derived ───────────────────────────────────────────────────────────────

    pub fn filtered(&self, now: DateTime<Utc>) -> Vec<&Route> {
        filter_routes(&self.routes, &self.search, self.show_completed, now)
    }

    pub fn day_index<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> RouteDayIndex<'_> {
        RouteDayIndex::build(&self.filtered(now), tz)
    }

    pub fn grid(&self) -> Vec<CalendarDay> {
        month_grid(self.month_cursor)
    }

    pub fn selected_routes<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<&Route> {
        self.day_index(now, tz).routes_on(self.selected_date).to_vec()
    }

    pub fn view<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> ScheduleView<'_> {
        let filtered = self.filtered(now);
        let index = RouteDayIndex::build(&filtered, tz);
        let today = now.with_timezone(tz).date_naive();
        let cells = self
            .grid()
            .into_iter()
            .map(|day| GridCell {
                day,
                summary: DaySummary::of(index.routes_on(day.date), now),
                is_selected: day.date == self.selected_date,
                is_today: day.date == today,
            })
            .collect();
        ScheduleView {
            month_label: month_label(self.month_cursor),
            cells,
            day_routes: index.routes_on(self.selected_date).to_vec(),
            visible_routes: filtered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::route::RejectedRoute;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-15T13:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn route(id: &str, driver: &str, start: &str, status: Option<&str>) -> Route {
        Route {
            id: Id::from(id),
            code: format!("R-{id}"),
            driver: driver.to_string(),
            vehicle: "Van".to_string(),
            start: DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc),
            stops: vec![],
            status: status.map(|s| json!(s)),
            completed_at: None,
        }
    }

    fn decoded(routes: Vec<Route>) -> DecodedRoutes {
        DecodedRoutes { routes, rejected: vec![] }
    }

    fn loaded(routes: Vec<Route>) -> ScheduleState {
        let mut state = ScheduleState::new(d(2024, 3, 15));
        let ticket = state.begin_refresh();
        state.apply_refresh(ticket, decoded(routes));
        state
    }

    fn sample() -> Vec<Route> {
        vec![
            route("1", "Carlos M.", "2024-03-15T08:00:00Z", Some("COMPLETED")),
            route("2", "Lucía", "2024-03-15T12:30:00Z", None),
            route("3", "Carlos R.", "2024-03-16T09:00:00Z", None),
            route("4", "Marta", "2024-02-28T09:00:00Z", None),
        ]
    }

    fn ids(routes: &[&Route]) -> Vec<String> {
        routes.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_new_state_starts_on_today() {
        let state = ScheduleState::new(d(2024, 3, 15));
        assert_eq!(state.month_cursor(), d(2024, 3, 15));
        assert_eq!(state.selected_date(), d(2024, 3, 15));
        assert!(!state.show_completed());
        assert!(state.routes().is_empty());
    }

    #[test]
    fn test_month_navigation_leaves_selection() {
        let mut state = ScheduleState::new(d(2024, 3, 31));
        state.go_prev_month();
        assert_eq!(state.month_cursor(), d(2024, 2, 29));
        state.go_next_month();
        state.go_next_month();
        assert_eq!(state.month_cursor(), d(2024, 4, 29));
        assert_eq!(state.selected_date(), d(2024, 3, 31));
    }

    #[test]
    fn test_go_today_resets_both_cursors() {
        let mut state = ScheduleState::new(d(2024, 3, 15));
        state.go_next_month();
        state.select_day(d(2024, 4, 20));
        state.go_today(d(2024, 3, 18));
        assert_eq!(state.month_cursor(), d(2024, 3, 18));
        assert_eq!(state.selected_date(), d(2024, 3, 18));
    }

    #[test]
    fn test_select_filler_day_does_not_move_month() {
        let mut state = ScheduleState::new(d(2024, 3, 15));
        let filler = state.grid()[0];
        assert!(!filler.in_month);
        state.select_day(filler.date);
        assert_eq!(state.selected_date(), d(2024, 2, 26));
        assert_eq!(state.month_cursor(), d(2024, 3, 15));
    }

    #[test]
    fn test_toggle_completed_keeps_cursors_and_swaps_partition() {
        let mut state = loaded(sample());
        state.select_day(d(2024, 3, 16));
        let pending = state.filtered(now()).len();
        state.toggle_completed();
        let completed = state.filtered(now()).len();
        assert_eq!(pending + completed, 4);
        assert_eq!(state.selected_date(), d(2024, 3, 16));
        assert_eq!(state.month_cursor(), d(2024, 3, 15));
    }

    #[test]
    fn test_selected_routes_follow_filters() {
        let mut state = loaded(sample());
        assert_eq!(ids(&state.selected_routes(now(), &Utc)), vec!["2"]);
        state.toggle_completed();
        assert_eq!(ids(&state.selected_routes(now(), &Utc)), vec!["1"]);
        state.toggle_completed();
        state.set_search("marta");
        assert!(state.selected_routes(now(), &Utc).is_empty());
    }

    #[test]
    fn test_search_editing() {
        let mut state = ScheduleState::new(d(2024, 3, 15));
        state.push_search_char('c');
        state.push_search_char('a');
        state.pop_search_char();
        assert_eq!(state.search(), "c");
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let mut state = ScheduleState::new(d(2024, 3, 15));
        let slow = state.begin_refresh();
        let fast = state.begin_refresh();
        assert!(!state.is_latest(slow));
        assert!(state.is_latest(fast));
        assert_eq!(
            state.apply_refresh(fast, decoded(sample())),
            RefreshOutcome::Applied { routes: 4, rejected: 0 }
        );
        assert_eq!(
            state.apply_refresh(slow, decoded(vec![])),
            RefreshOutcome::Stale
        );
        assert_eq!(state.routes().len(), 4);
    }

    #[test]
    fn test_refresh_replaces_cache_and_records_rejections() {
        let mut state = loaded(sample());
        let ticket = state.begin_refresh();
        let outcome = state.apply_refresh(
            ticket,
            DecodedRoutes {
                routes: vec![route("9", "Ana", "2024-03-20T08:00:00Z", None)],
                rejected: vec![RejectedRoute { index: 1, id: None, reason: "bad start".to_string() }],
            },
        );
        assert_eq!(outcome, RefreshOutcome::Applied { routes: 1, rejected: 1 });
        assert_eq!(state.last_rejected(), 1);
        assert_eq!(state.routes()[0].id.as_str(), "9");
    }

    #[test]
    fn test_remove_route_splices_cache() {
        let mut state = loaded(sample());
        assert!(state.remove_route(&Id::from("2")));
        assert!(!state.remove_route(&Id::from("2")));
        let ids: Vec<_> = state.routes().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_view_marks_selected_today_and_counts() {
        let mut state = loaded(sample());
        state.select_day(d(2024, 3, 16));
        let view = state.view(now(), &Utc);
        assert_eq!(view.month_label, "March 2024");
        assert_eq!(view.cells.len(), 42);
        assert_eq!(view.visible_routes, 2);

        let cell = |date: NaiveDate| view.cells.iter().find(|c| c.day.date == date).copied().unwrap();
        assert!(cell(d(2024, 3, 15)).is_today);
        assert!(cell(d(2024, 3, 16)).is_selected);
        assert_eq!(cell(d(2024, 3, 15)).summary, DaySummary { pending: 1, completed: 0 });
        // route 4 started two weeks ago, so it only shows up under "completed"
        assert_eq!(cell(d(2024, 2, 28)).summary.total(), 0);
        assert!(!cell(d(2024, 2, 28)).day.in_month);
        assert_eq!(ids(&view.day_routes), vec!["3"]);
    }

    #[test]
    fn test_completed_view_counts_filler_days() {
        let mut state = loaded(sample());
        state.toggle_completed();
        let view = state.view(now(), &Utc);
        let feb_28 = view.cells.iter().find(|c| c.day.date == d(2024, 2, 28)).unwrap();
        assert_eq!(feb_28.summary, DaySummary { pending: 0, completed: 1 });
        assert_eq!(view.visible_routes, 2);
        assert!(view.day_routes.iter().all(|r| r.id.as_str() == "1"));
    }
}
