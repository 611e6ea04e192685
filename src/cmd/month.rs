use crate::calc::{
    CalendarDay, DaySummary, GRID_CELLS, RouteDayIndex, filter_routes, month_grid, month_label,
};
use crate::cmd::Context;
use crate::data::Route;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

const CELL_WIDTH: usize = 9;

pub fn run(ctx: &Context, month: Option<&str>, show_completed: bool) -> Result<()> {
    let cursor = match month {
        Some(raw) => parse_month(raw)?,
        None => Local::now().date_naive(),
    };
    let decoded = ctx.client()?.list_routes()?;
    write_month(
        cursor,
        &decoded.routes,
        show_completed,
        Utc::now(),
        &Local,
        &mut std::io::stdout(),
    )
}

/// `YYYY-MM` to the first day of that month.
pub(crate) fn parse_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{raw}' (expected YYYY-MM)"))
}

fn cell_text(day: &CalendarDay, summary: &DaySummary) -> String {
    if !day.in_month {
        return format!("({:>2})", day.date.day());
    }
    if summary.total() == 0 {
        format!("{:>2}", day.date.day())
    } else {
        format!("{:>2} {}/{}", day.date.day(), summary.pending, summary.completed)
    }
}

/// Monday-first grid; each in-month day shows `pending/completed` counts of
/// the routes that pass the completion filter.
pub(crate) fn write_month<W: std::io::Write, Tz: TimeZone>(
    cursor: NaiveDate,
    routes: &[Route],
    show_completed: bool,
    now: DateTime<Utc>,
    tz: &Tz,
    out: &mut W,
) -> Result<()> {
    let filtered = filter_routes(routes, "", show_completed, now);
    let index = RouteDayIndex::build(&filtered, tz);
    let view = if show_completed { "completed" } else { "pending" };

    writeln!(out, "{} ({view})", month_label(cursor))?;
    writeln!(out, "---")?;
    let header: String = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
        .iter()
        .map(|d| format!("{d:<CELL_WIDTH$}"))
        .collect();
    writeln!(out, "{}", header.trim_end())?;
    let mut shown = 0;
    for week in month_grid(cursor).chunks(7) {
        let line: String = week
            .iter()
            .map(|day| {
                let summary = DaySummary::of(index.routes_on(day.date), now);
                shown += summary.total();
                format!("{:<CELL_WIDTH$}", cell_text(day, &summary))
            })
            .collect();
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {shown} {view} route(s) on the {GRID_CELLS} days shown")?;
    let hidden = index.route_count() - shown;
    if hidden > 0 {
        writeln!(out, "({hidden} more outside these weeks)")?;
    }
    Ok(())
}
