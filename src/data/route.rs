use crate::data::id::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Contact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, alias = "sign", skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Stop {
    pub fn new(name: &str, address: &str, notes: &str, eta: Option<DateTime<Utc>>) -> Self {
        Stop {
            name: name.to_string(),
            address: address.to_string(),
            notes: notes.to_string(),
            eta,
            ..Stop::default()
        }
    }
}

/// A planned delivery run as served by `GET /routes`.
///
/// `status` and `completed_at` are kept as raw JSON because older backends
/// send neither, newer ones send a string status, and some only stamp a
/// completion time. The completion classifier interprets them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Id,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub vehicle: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Value>,
}

impl Route {
    /// Text the search box matches against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.code, self.driver, self.vehicle)
    }
}

/// Body of `POST /routes`; the server assigns `id` and `code`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewRoute {
    pub driver: String,
    pub vehicle: String,
    pub start: DateTime<Utc>,
    pub stops: Vec<Stop>,
}

/// Outcome of decoding a route list element by element.
#[derive(Debug, Default)]
pub struct DecodedRoutes {
    pub routes: Vec<Route>,
    pub rejected: Vec<RejectedRoute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRoute {
    pub index: usize,
    /// The raw `id` field when one was present, for reporting.
    pub id: Option<String>,
    pub reason: String,
}

/// Decodes every element independently so that one record with a broken
/// `start` does not take the whole list down with it.
pub fn decode_routes(items: Vec<Value>) -> DecodedRoutes {
    let mut out = DecodedRoutes::default();
    for (index, item) in items.into_iter().enumerate() {
        let id = item.get("id").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        match serde_json::from_value::<Route>(item) {
            Ok(route) => out.routes.push(route),
            Err(e) => {
                tracing::warn!(index, id = ?id, error = %e, "rejecting malformed route");
                out.rejected.push(RejectedRoute {
                    index,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }
    out
}
