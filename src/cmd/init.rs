use crate::cmd::Context;
use crate::data::AppSettings;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

pub fn run(ctx: &Context) -> Result<()> {
    let dir = ctx.data_dir();
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let written = run_in_dir(dir, ctx.settings())?;
    if written {
        println!("Wrote {}", dir.join("config.yaml").display());
    } else {
        println!("{} already exists, left unchanged.", dir.join("config.yaml").display());
    }
    Ok(())
}

/// Writes `settings` to config.yaml unless one is already there.
/// Returns whether a file was written.
pub(crate) fn run_in_dir(dir: &Path, settings: &AppSettings) -> Result<bool> {
    if dir.join("config.yaml").exists() {
        return Ok(false);
    }
    settings.save_to(dir)?;
    Ok(true)
}
