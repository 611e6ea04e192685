use crate::data::persistence::Persistable;
use crate::data::staff::User;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Credentials obtained from `POST /auth/login`.
///
/// The session is loaded once at startup and handed to whatever needs it;
/// `clear` is the only way to log out.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Persistable for Session {
    fn filename() -> &'static str {
        "session.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl Session {
    pub fn new(token: String, user: User) -> Self {
        Session {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_from(dir)
    }

    pub fn store(&self, dir: &Path) -> Result<()> {
        self.save_to(dir)
    }

    pub fn clear(dir: &Path) -> Result<()> {
        Self::remove_from(dir)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
