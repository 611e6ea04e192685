use crate::data::Route;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// How long after its start a route without explicit status is assumed done.
pub const COMPLETION_GRACE_HOURS: i64 = 2;

pub fn completion_grace() -> Duration {
    Duration::hours(COMPLETION_GRACE_HOURS)
}

/// First matching rule wins:
/// 1. a non-empty string `status` decides on its own (`COMPLETED`, any case);
/// 2. otherwise a truthy `completedAt` means completed;
/// 3. otherwise the route is completed once `now - start` exceeds the grace window.
///
/// Depends on `now`, so callers must not cache the verdict.
pub fn is_route_completed(route: &Route, now: DateTime<Utc>) -> bool {
    if let Some(Value::String(status)) = &route.status {
        if !status.is_empty() {
            return status.eq_ignore_ascii_case("COMPLETED");
        }
    }
    if route.completed_at.as_ref().is_some_and(is_truthy) {
        return true;
    }
    now.signed_duration_since(route.start) > completion_grace()
}

/// JSON truthiness as the dashboard backend's clients understand it.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
