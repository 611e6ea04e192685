use crate::calc::{RouteDayIndex, filter_routes, is_route_completed};
use crate::cmd::Context;
use crate::data::Route;
use crate::data::route::RejectedRoute;
use crate::ui::calendar_view::format_time;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::fmt::Display;

pub fn run(ctx: &Context, search: &str, show_completed: bool, day: Option<&str>) -> Result<()> {
    let day = day.map(parse_day).transpose()?;
    let decoded = ctx.client()?.list_routes()?;
    let now = Utc::now();
    let filtered = filter_routes(&decoded.routes, search, show_completed, now);
    let listed = select_routes(&filtered, day, &Local);
    write_routes(&listed, &decoded.rejected, now, &Local, &mut std::io::stdout())
}

pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid day '{raw}' (expected YYYY-MM-DD)"))
}

/// One day's bucket when `day` is given, otherwise everything. Both keep
/// the order the server returned.
pub(crate) fn select_routes<'a, Tz: TimeZone>(
    routes: &[&'a Route],
    day: Option<NaiveDate>,
    tz: &Tz,
) -> Vec<&'a Route> {
    match day {
        Some(day) => RouteDayIndex::build(routes, tz).routes_on(day).to_vec(),
        None => routes.to_vec(),
    }
}

pub(crate) fn write_routes<W: std::io::Write, Tz: TimeZone>(
    routes: &[&Route],
    rejected: &[RejectedRoute],
    now: DateTime<Utc>,
    tz: &Tz,
    out: &mut W,
) -> Result<()>
where
    Tz::Offset: Display,
{
    writeln!(out, "Routes")?;
    writeln!(out, "---")?;
    writeln!(
        out,
        "  {:<6} {:<10} {:<20} {:<16} {:<12} {:<6} {}",
        "ID", "Code", "Driver", "Vehicle", "Start", "Stops", "Status"
    )?;
    for r in routes {
        writeln!(
            out,
            "  {:<6} {:<10} {:<20} {:<16} {:<12} {:<6} {}",
            r.id,
            r.code,
            r.driver,
            r.vehicle,
            format_time(r.start, tz),
            r.stops.len(),
            if is_route_completed(r, now) { "Completed" } else { "Pending" }
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} route(s)", routes.len())?;
    if !rejected.is_empty() {
        writeln!(out, "Skipped {} malformed record(s):", rejected.len())?;
        for r in rejected {
            let id = r.id.as_deref().unwrap_or("?");
            writeln!(out, "  #{} (id {id}): {}", r.index, r.reason)?;
        }
    }
    Ok(())
}
