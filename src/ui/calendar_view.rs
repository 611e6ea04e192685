use crate::api::{ApiError, RouteSource};
use crate::calc::is_route_completed;
use crate::data::route_file::files_of_kind;
use crate::data::{DecodedRoutes, FileKind, Id, Route, RouteFile, Stop};
use crate::ui::schedule::{GridCell, RefreshOutcome, RefreshTicket, ScheduleState, ScheduleView};
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::fmt::Display;
use std::io::Stdout;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

const PENDING_COLOR: Color = Color::Blue;
const COMPLETED_COLOR: Color = Color::Green;
const SECTION_BG: Color = Color::Rgb(40, 44, 52);
const CELL_WIDTH: u16 = 11;

const PENDING_MARK: &str = "○";
const COMPLETED_MARK: &str = "●";

/// Answers from API calls made on worker threads.
enum Message {
    Refresh(RefreshTicket, Result<DecodedRoutes, ApiError>),
    Files(Id, Result<Vec<RouteFile>, ApiError>),
    Deleted {
        id: Id,
        code: String,
        result: Result<(), ApiError>,
    },
}

#[derive(PartialEq, Debug)]
enum Mode {
    Normal,
    Search,
    ConfirmDelete { id: Id, code: String },
}

#[derive(PartialEq, Default, Debug)]
enum ViewState {
    #[default]
    Calendar,
    RouteDetail,
}

#[derive(Debug, PartialEq)]
pub enum FilesState {
    Loading,
    Loaded(Vec<RouteFile>),
    Failed(String),
}

/// A route opened in the detail pane, with its delivery-proof files.
pub struct RouteDetail {
    pub route: Route,
    pub files: FilesState,
}

pub struct App<Tz: TimeZone = Local> {
    schedule: ScheduleState,
    source: Arc<dyn RouteSource>,
    tz: Tz,
    clock: fn() -> DateTime<Utc>,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    /// Refreshes started but not yet answered.
    in_flight: usize,
    /// Route whose delete request is still out.
    deleting: Option<Id>,
    mode: Mode,
    view_state: ViewState,
    /// Highlighted entry in the selected day's route list.
    route_cursor: usize,
    detail: Option<RouteDetail>,
    /// Last operation result (message, color). Cleared on next keypress.
    status: Option<(String, Color)>,
    api_base: String,
    account: Option<String>,
}

impl<Tz: TimeZone> App<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(
        source: Arc<dyn RouteSource>,
        tz: Tz,
        clock: fn() -> DateTime<Utc>,
        api_base: String,
        account: Option<String>,
    ) -> Self {
        let today = clock().with_timezone(&tz).date_naive();
        let (tx, rx) = mpsc::channel();
        App {
            schedule: ScheduleState::new(today),
            source,
            tz,
            clock,
            tx,
            rx,
            in_flight: 0,
            deleting: None,
            mode: Mode::Normal,
            view_state: ViewState::Calendar,
            route_cursor: 0,
            detail: None,
            status: None,
            api_base,
            account,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.tz).date_naive()
    }

    // ── background calls ──────────────────────────────────────────────────────

    /// Runs `call` against the route source on a worker thread and posts the
    /// resulting message back to the event loop.
    fn spawn_call<F>(&self, call: F)
    where
        F: FnOnce(&dyn RouteSource) -> Message + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let message = call(source.as_ref());
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(message);
        });
    }

    /// Starts a background fetch of the route list. The answer is applied by
    /// `poll_messages`.
    pub fn request_refresh(&mut self) {
        let ticket = self.schedule.begin_refresh();
        self.spawn_call(move |source| Message::Refresh(ticket, source.fetch_routes()));
        self.in_flight += 1;
        self.status = Some(("Refreshing routes...".to_string(), Color::DarkGray));
    }

    pub fn poll_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Refresh(ticket, result) => self.handle_refresh(ticket, result),
            Message::Files(id, result) => self.handle_files(id, result),
            Message::Deleted { id, code, result } => self.handle_deleted(id, &code, result),
        }
    }

    fn handle_refresh(&mut self, ticket: RefreshTicket, result: Result<DecodedRoutes, ApiError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.schedule.is_latest(ticket) {
            debug!(ok = result.is_ok(), "ignoring answer to a superseded refresh");
            return;
        }
        match result {
            Ok(decoded) => match self.schedule.apply_refresh(ticket, decoded) {
                RefreshOutcome::Applied { routes, rejected } => {
                    self.clamp_route_cursor();
                    let msg = if rejected > 0 {
                        format!("Loaded {routes} route(s), skipped {rejected} malformed")
                    } else {
                        format!("Loaded {routes} route(s)")
                    };
                    let color = if rejected > 0 { Color::Yellow } else { Color::Green };
                    self.status = Some((msg, color));
                }
                RefreshOutcome::Stale => {}
            },
            Err(e) => {
                warn!(error = %e, "route refresh failed");
                let msg = if e.status() == Some(401) {
                    "Session expired: run `routeboard login` again".to_string()
                } else {
                    format!("Refresh failed: {e}")
                };
                self.status = Some((msg, Color::Red));
            }
        }
    }

    // ── selection helpers ─────────────────────────────────────────────────────

    fn selected_routes(&self) -> Vec<&Route> {
        self.schedule.selected_routes(self.now(), &self.tz)
    }

    fn highlighted_route(&self) -> Option<&Route> {
        self.selected_routes().get(self.route_cursor).copied()
    }

    fn clamp_route_cursor(&mut self) {
        let len = self.selected_routes().len();
        if self.route_cursor >= len {
            self.route_cursor = len.saturating_sub(1);
        }
    }

    fn move_selection(&mut self, days: i64) {
        let selected = self.schedule.selected_date();
        if let Some(d) = selected.checked_add_signed(Duration::days(days)) {
            self.schedule.select_day(d);
            self.route_cursor = 0;
        }
    }

    fn cycle_route(&mut self, forward: bool) {
        let len = self.selected_routes().len();
        if len == 0 {
            return;
        }
        self.route_cursor = if forward {
            (self.route_cursor + 1) % len
        } else {
            (self.route_cursor + len - 1) % len
        };
    }

    /// Opens the pane right away; the file list fills in when it arrives.
    fn open_detail(&mut self) {
        let Some(route) = self.highlighted_route().cloned() else {
            return;
        };
        let id = route.id.clone();
        self.spawn_call(move |source| {
            let result = source.fetch_files(&id);
            Message::Files(id, result)
        });
        self.detail = Some(RouteDetail {
            route,
            files: FilesState::Loading,
        });
        self.view_state = ViewState::RouteDetail;
    }

    fn handle_files(&mut self, id: Id, result: Result<Vec<RouteFile>, ApiError>) {
        // The pane may have been closed or moved to another route meanwhile.
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.route.id != id || detail.files != FilesState::Loading {
            return;
        }
        detail.files = match result {
            Ok(files) => FilesState::Loaded(files),
            Err(e) => {
                warn!(route_id = %id, error = %e, "failed to load route files");
                FilesState::Failed(e.to_string())
            }
        };
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.view_state = ViewState::Calendar;
    }

    fn ask_delete(&mut self) {
        let target = match self.view_state {
            ViewState::RouteDetail => self.detail.as_ref().map(|d| &d.route),
            ViewState::Calendar => self.highlighted_route(),
        };
        let prompt = target.map(|route| Mode::ConfirmDelete {
            id: route.id.clone(),
            code: route.code.clone(),
        });
        if let Some(prompt) = prompt {
            self.mode = prompt;
        }
    }

    fn delete_route(&mut self, id: Id, code: String) {
        if self.deleting.is_some() {
            self.status = Some(("Another delete is still running".to_string(), Color::Yellow));
            return;
        }
        self.status = Some((format!("Deleting route {code}..."), Color::DarkGray));
        self.deleting = Some(id.clone());
        self.spawn_call(move |source| {
            let result = source.remove_route(&id);
            Message::Deleted { id, code, result }
        });
    }

    /// The cache is spliced only once the server confirmed the delete.
    fn handle_deleted(&mut self, id: Id, code: &str, result: Result<(), ApiError>) {
        self.deleting = None;
        match result {
            Ok(()) => {
                self.schedule.remove_route(&id);
                info!(route_id = %id, "route removed from calendar");
                if self.detail.as_ref().is_some_and(|d| d.route.id == id) {
                    self.close_detail();
                }
                self.clamp_route_cursor();
                self.status = Some((format!("Route {code} deleted"), Color::Green));
            }
            Err(e) => {
                warn!(route_id = %id, error = %e, "route delete failed");
                self.status = Some((format!("Delete failed: {e}"), Color::Red));
            }
        }
    }

    // ── input ─────────────────────────────────────────────────────────────────

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::ConfirmDelete { id, code: route_code } => {
                match code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => self.delete_route(id, route_code),
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                        self.status = Some(("Delete cancelled".to_string(), Color::DarkGray));
                    }
                    _ => self.mode = Mode::ConfirmDelete { id, code: route_code },
                }
                return false;
            }
            Mode::Search => {
                match code {
                    KeyCode::Enter | KeyCode::Esc => {}
                    KeyCode::Backspace => {
                        self.schedule.pop_search_char();
                        self.mode = Mode::Search;
                    }
                    KeyCode::Char(c) => {
                        self.schedule.push_search_char(c);
                        self.mode = Mode::Search;
                    }
                    _ => self.mode = Mode::Search,
                }
                self.clamp_route_cursor();
                return false;
            }
            Mode::Normal => {}
        }

        self.status = None;

        if self.view_state == ViewState::RouteDetail {
            match code {
                KeyCode::Esc | KeyCode::Backspace => self.close_detail(),
                KeyCode::Char('x') => self.ask_delete(),
                KeyCode::Char('q') => return true,
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Left => self.move_selection(-1),
            KeyCode::Right => self.move_selection(1),
            KeyCode::Up => self.move_selection(-7),
            KeyCode::Down => self.move_selection(7),
            KeyCode::Char('n') => self.schedule.go_next_month(),
            KeyCode::Char('p') => self.schedule.go_prev_month(),
            KeyCode::Char('t') => {
                let today = self.today();
                self.schedule.go_today(today);
                self.route_cursor = 0;
            }
            KeyCode::Char('c') => {
                self.schedule.toggle_completed();
                self.route_cursor = 0;
            }
            KeyCode::Char('/') | KeyCode::Char('s') => self.mode = Mode::Search,
            KeyCode::Char('r') => self.request_refresh(),
            KeyCode::Tab => self.cycle_route(true),
            KeyCode::BackTab => self.cycle_route(false),
            KeyCode::Enter => self.open_detail(),
            KeyCode::Char('x') => self.ask_delete(),
            KeyCode::Esc if !self.schedule.search().is_empty() => {
                self.schedule.set_search("");
                self.clamp_route_cursor();
            }
            KeyCode::Char('q') => return true,
            _ => {}
        }
        false
    }

    // ── rendering ─────────────────────────────────────────────────────────────

    pub fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // header
                Constraint::Min(10),   // grid or detail
                Constraint::Length(1), // status line
                Constraint::Length(6), // key help
            ])
            .split(f.area());

        let view = self.schedule.view(self.now(), &self.tz);
        self.render_header(f, chunks[0], &view);
        match self.view_state {
            ViewState::Calendar => {
                let body = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(9), Constraint::Min(3)])
                    .split(chunks[1]);
                render_grid(f, body[0], &view.cells);
                self.render_day_list(f, body[1], &view.day_routes);
            }
            ViewState::RouteDetail => self.render_detail(f, chunks[1]),
        }
        self.render_status(f, chunks[2]);
        self.render_help(f, chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect, view: &ScheduleView) {
        let kind = if self.schedule.show_completed() { "completed" } else { "pending" };
        let mut spans = vec![
            Span::styled(
                view.month_label.clone(),
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ),
            Span::raw(format!("   {} {kind} route(s)", view.visible_routes)),
        ];
        if !self.schedule.search().is_empty() || self.mode == Mode::Search {
            spans.push(Span::raw(format!("   search: {}", self.schedule.search())));
            if self.mode == Mode::Search {
                spans.push(Span::raw("_"));
            }
        }
        if self.in_flight > 0 {
            spans.push(Span::styled("   (refreshing)", Style::default().fg(Color::DarkGray)));
        }
        let rejected = self.schedule.last_rejected();
        if rejected > 0 {
            spans.push(Span::styled(
                format!("   {rejected} malformed skipped"),
                Style::default().fg(Color::Yellow),
            ));
        }
        let mut lines = vec![Line::from(spans)];
        if let Some(account) = &self.account {
            lines.push(Line::from(Span::styled(
                account.clone(),
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn render_day_list(&self, f: &mut Frame, area: Rect, routes: &[&Route]) {
        let now = self.now();
        let selected = self.schedule.selected_date();
        let mut lines = vec![Line::from(Span::styled(
            format!("Routes for {}", selected.format("%a %d %b %Y")),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if routes.is_empty() {
            lines.push(Line::from("  No routes for the selected day."));
        }
        for (i, route) in routes.iter().enumerate() {
            let marker = if i == self.route_cursor { "> " } else { "  " };
            let completed = is_route_completed(route, now);
            let mut style = Style::default();
            if i == self.route_cursor {
                style = style.add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{marker}{}", route_summary(route, &self.tz)),
                    style,
                ),
                Span::raw("  "),
                status_badge(completed),
            ]));
            for (idx, stop) in route.stops.iter().enumerate() {
                lines.push(Line::from(format!("      {}", stop_summary(idx, stop, &self.tz))));
            }
        }
        let p = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        f.render_widget(p, area);
    }

    fn render_detail(&self, f: &mut Frame, area: Rect) {
        let Some(detail) = &self.detail else {
            return;
        };
        let route = &detail.route;
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("Route {}", route.code),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                status_badge(is_route_completed(route, self.now())),
            ]),
            Line::from(format!(
                "Driver: {}  ·  Vehicle: {}  ·  Start: {}",
                route.driver,
                route.vehicle,
                format_time(route.start, &self.tz)
            )),
            Line::from(""),
            Line::from(Span::styled("Stops", Style::default().add_modifier(Modifier::BOLD))),
        ];
        if route.stops.is_empty() {
            lines.push(Line::from("  (no stops)"));
        }
        for (idx, stop) in route.stops.iter().enumerate() {
            lines.push(Line::from(format!("  {}", stop_summary(idx, stop, &self.tz))));
            if !stop.notes.is_empty() {
                lines.push(Line::from(format!("      Notes: {}", stop.notes)));
            }
            if let Some(contact) = &stop.contact {
                let phone = contact.phone.as_deref().unwrap_or("—");
                let email = contact.email.as_deref().unwrap_or("—");
                lines.push(Line::from(format!("      Contact: {phone}  {email}")));
            }
        }
        lines.push(Line::from(""));
        match &detail.files {
            FilesState::Loading => lines.push(Line::from(Span::styled(
                "Loading files...",
                Style::default().fg(Color::DarkGray),
            ))),
            FilesState::Loaded(files) => {
                for kind in FileKind::ALL {
                    lines.push(Line::from(Span::styled(
                        kind.heading(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                    let of_kind = files_of_kind(files, kind);
                    if of_kind.is_empty() {
                        lines.push(Line::from("  (none)"));
                    }
                    for file in of_kind {
                        lines.push(Line::from(format!(
                            "  [{}] {}  {}",
                            file.id,
                            file.original_name,
                            file.href(&self.api_base)
                        )));
                    }
                }
            }
            FilesState::Failed(msg) => lines.push(Line::from(Span::styled(
                format!("Could not load files: {msg}"),
                Style::default().fg(Color::Red),
            ))),
        }
        let p = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        f.render_widget(p, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let line = match &self.mode {
            Mode::ConfirmDelete { code, .. } => Line::from(Span::styled(
                format!("Delete route {code}? (y/n)"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            _ => match &self.status {
                Some((msg, color)) => Line::from(Span::styled(
                    msg.clone(),
                    Style::default().fg(*color).add_modifier(Modifier::BOLD),
                )),
                None => Line::from(""),
            },
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let rows = vec![
            Row::new(vec!["← → ↑ ↓", "Move day", "n / p", "Next/prev month"]),
            Row::new(vec!["t", "Today", "c", "Pending/completed"]),
            Row::new(vec!["/", "Search", "r", "Refresh"]),
            Row::new(vec!["Tab", "Next route", "Enter", "Route detail"]),
            Row::new(vec!["x", "Delete route", "q/Ctrl+C", "Quit"]),
        ];
        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Length(20),
            ],
        )
        .block(Block::default().borders(Borders::NONE))
        .column_spacing(1);
        f.render_widget(table, area);
    }
}

fn render_grid(f: &mut Frame, area: Rect, cells: &[GridCell]) {
    let header = Row::new(
        ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
            .into_iter()
            .map(|d| Cell::from(d).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().bg(SECTION_BG));
    let rows: Vec<Row> = cells
        .chunks(7)
        .map(|week| Row::new(week.iter().map(|cell| Cell::from(cell_line(cell)))))
        .collect();
    let table = Table::new(rows, [Constraint::Length(CELL_WIDTH); 7])
        .header(header)
        .block(Block::default().borders(Borders::NONE))
        .column_spacing(1);
    f.render_widget(table, area);
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app<Tz: TimeZone>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<Tz>,
) -> Result<()>
where
    Tz::Offset: Display,
{
    app.request_refresh();
    loop {
        app.poll_messages();
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(50))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ── Formatting helpers ────────────────────────────────────────────────────────

/// `dd/mm HH:MM` in the viewer's zone.
pub(crate) fn format_time<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%d/%m %H:%M").to_string()
}

pub(crate) fn route_summary<Tz: TimeZone>(route: &Route, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{}  {}  [{}]  start {}",
        route.code,
        route.driver,
        route.vehicle,
        format_time(route.start, tz)
    )
}

/// Stops are numbered from 1 in delivery order.
pub(crate) fn stop_summary<Tz: TimeZone>(idx: usize, stop: &Stop, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let eta = stop
        .eta
        .map(|t| format_time(t, tz))
        .unwrap_or_else(|| "—".to_string());
    let delivered = if stop.delivered { "  ✓" } else { "" };
    format!("#{} · {} · {} · ETA {}{}", idx + 1, stop.name, stop.address, eta, delivered)
}

fn status_badge(completed: bool) -> Span<'static> {
    if completed {
        Span::styled("Completed", Style::default().fg(COMPLETED_COLOR))
    } else {
        Span::styled("Pending", Style::default().fg(PENDING_COLOR))
    }
}

/// Day number followed by pending (○) and completed (●) markers and `+N`.
pub(crate) fn cell_markers(cell: &GridCell) -> (String, String, String) {
    let s = &cell.summary;
    let overflow = s.overflow().map(|n| format!("+{n}")).unwrap_or_default();
    (
        PENDING_MARK.repeat(s.pending_markers()),
        COMPLETED_MARK.repeat(s.completed_markers()),
        overflow,
    )
}

fn cell_line(cell: &GridCell) -> Line<'static> {
    let (pending, completed, overflow) = cell_markers(cell);
    Line::from(vec![
        Span::styled(format!("{:>2}", cell.day.date.day()), grid_cell_style(cell)),
        Span::raw(" "),
        Span::styled(pending, Style::default().fg(PENDING_COLOR)),
        Span::styled(completed, Style::default().fg(COMPLETED_COLOR)),
        Span::styled(overflow, Style::default().fg(Color::DarkGray)),
    ])
}

/// Style of the day number in a grid cell.
pub(crate) fn grid_cell_style(cell: &GridCell) -> Style {
    if cell.is_selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else if cell.is_today {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else if !cell.day.in_month {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    }
}
