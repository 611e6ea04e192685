use crate::cmd::Context;
use crate::data::{Id, NewRoute, Route, Stop};
use anyhow::{Context as _, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub fn run_new_route(
    ctx: &Context,
    driver: &str,
    vehicle: &str,
    start: Option<&str>,
    stop_specs: &[String],
) -> Result<()> {
    let route = build_new_route(driver, vehicle, start, stop_specs, Utc::now(), &Local)?;
    let created = ctx.client()?.create_route(&route)?;
    write_created(created.as_ref(), &route, &mut std::io::stdout())
}

pub fn run_delete_route(ctx: &Context, id: &str) -> Result<()> {
    let id = Id::new(id);
    ctx.client()?.delete_route(&id)?;
    println!("Route {id} deleted.");
    Ok(())
}

/// Driver and vehicle are required; start defaults to `now`.
pub(crate) fn build_new_route<Tz: TimeZone>(
    driver: &str,
    vehicle: &str,
    start: Option<&str>,
    stop_specs: &[String],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<NewRoute> {
    let driver = driver.trim();
    let vehicle = vehicle.trim();
    if driver.is_empty() || vehicle.is_empty() {
        bail!("a route needs both a driver and a vehicle");
    }
    let start = match start {
        Some(raw) => parse_time(raw, tz)?,
        None => now,
    };
    let stops = stop_specs
        .iter()
        .map(|spec| parse_stop_spec(spec, tz))
        .collect::<Result<Vec<_>>>()?;
    Ok(NewRoute {
        driver: driver.to_string(),
        vehicle: vehicle.to_string(),
        start,
        stops,
    })
}

/// RFC 3339, or a wall-clock time in `tz` as `YYYY-MM-DD HH:MM`.
pub(crate) fn parse_time<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| anyhow!("invalid time '{raw}' (expected RFC 3339 or YYYY-MM-DD HH:MM)"))?;
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("'{raw}' does not exist in the local time zone"))?;
    Ok(local.with_timezone(&Utc))
}

/// `name;address[;notes[;eta]]`. Name and address must be non-empty.
pub(crate) fn parse_stop_spec<Tz: TimeZone>(spec: &str, tz: &Tz) -> Result<Stop> {
    let mut parts = spec.splitn(4, ';').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let address = parts.next().unwrap_or_default();
    let notes = parts.next().unwrap_or_default();
    let eta = parts.next().filter(|s| !s.is_empty());
    if name.is_empty() || address.is_empty() {
        bail!("invalid stop '{spec}' (expected name;address[;notes[;eta]])");
    }
    let eta = eta.map(|raw| parse_time(raw, tz)).transpose()?;
    Ok(Stop::new(name, address, notes, eta))
}

pub(crate) fn write_created<W: std::io::Write>(
    created: Option<&Route>,
    sent: &NewRoute,
    out: &mut W,
) -> Result<()> {
    match created {
        Some(route) => writeln!(out, "Route {} created (id {}).", route.code, route.id)?,
        None => writeln!(out, "Route created.")?,
    }
    writeln!(out, "Driver: {}  Vehicle: {}", sent.driver, sent.vehicle)?;
    writeln!(out, "Stops: {}", sent.stops.len())?;
    Ok(())
}
