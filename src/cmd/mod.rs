pub mod files;
pub mod init;
pub mod login;
pub mod month;
pub mod root;
pub mod route_edit;
pub mod routes;
pub mod staff;

use crate::api::{ApiClient, ApiError};
use crate::data::{AppSettings, Session};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// What every subcommand needs: where local state lives and how to reach the API.
pub struct Context {
    data_dir: PathBuf,
    settings: AppSettings,
}

impl Context {
    pub fn new(data_dir: PathBuf, settings: AppSettings) -> Self {
        Context { data_dir, settings }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn session(&self) -> Result<Session> {
        Session::load(&self.data_dir)
    }

    /// Client carrying the stored bearer token. Fails early when nobody is
    /// logged in rather than letting the server answer 401.
    pub fn client(&self) -> Result<ApiClient> {
        let session = self.session()?;
        if !session.is_authenticated() {
            return Err(ApiError::NotLoggedIn.into());
        }
        Ok(ApiClient::new(&self.settings, &session)?)
    }
}
