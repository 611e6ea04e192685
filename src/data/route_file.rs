use crate::data::id::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Invoice,
    Receipt,
    #[serde(other)]
    Other,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Invoice, FileKind::Receipt, FileKind::Other];

    /// Value of the `type` query parameter on upload.
    pub fn query_value(self) -> &'static str {
        match self {
            FileKind::Invoice => "invoice",
            FileKind::Receipt => "receipt",
            FileKind::Other => "other",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            FileKind::Invoice => "Delivery invoices",
            FileKind::Receipt => "Fuel / meal receipts",
            FileKind::Other => "Other files",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invoice" => Ok(FileKind::Invoice),
            "receipt" => Ok(FileKind::Receipt),
            "other" => Ok(FileKind::Other),
            other => Err(format!("unknown file kind '{other}' (expected invoice, receipt or other)")),
        }
    }
}

/// Delivery-proof file metadata attached to a route.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteFile {
    pub id: Id,
    pub route_id: Id,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub uploaded_at: String,
}

impl RouteFile {
    /// Absolute link: server-relative urls are resolved against the API base.
    pub fn href(&self, api_base: &str) -> String {
        if self.url.starts_with("http") {
            self.url.clone()
        } else {
            format!("{}{}", api_base.trim_end_matches('/'), self.url)
        }
    }
}

pub fn files_of_kind(files: &[RouteFile], kind: FileKind) -> Vec<&RouteFile> {
    files.iter().filter(|f| f.kind == kind).collect()
}
