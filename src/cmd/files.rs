use crate::cmd::Context;
use crate::data::route_file::files_of_kind;
use crate::data::{FileKind, Id, RouteFile};
use anyhow::{Result, bail};
use std::path::PathBuf;

pub fn run_list(ctx: &Context, route_id: &str) -> Result<()> {
    let route_id = Id::new(route_id);
    let files = ctx.client()?.list_files(&route_id)?;
    write_files(&route_id, &files, ctx.settings().api_base(), &mut std::io::stdout())
}

pub fn run_upload(ctx: &Context, route_id: &str, kind: FileKind, paths: &[PathBuf]) -> Result<()> {
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        bail!("{} is not a readable file", missing.display());
    }
    let route_id = Id::new(route_id);
    ctx.client()?.upload_files(&route_id, kind, paths)?;
    println!("Uploaded {} {kind} file(s) to route {route_id}.", paths.len());
    Ok(())
}

pub fn run_delete(ctx: &Context, route_id: &str, file_id: &str) -> Result<()> {
    let route_id = Id::new(route_id);
    let file_id = Id::new(file_id);
    ctx.client()?.delete_file(&route_id, &file_id)?;
    println!("File {file_id} removed from route {route_id}.");
    Ok(())
}

/// Files grouped under one heading per kind, in `FileKind::ALL` order.
pub(crate) fn write_files<W: std::io::Write>(
    route_id: &Id,
    files: &[RouteFile],
    api_base: &str,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Files for route {route_id}")?;
    for kind in FileKind::ALL {
        let of_kind = files_of_kind(files, kind);
        writeln!(out, "---")?;
        writeln!(out, "{} ({})", kind.heading(), of_kind.len())?;
        for f in of_kind {
            writeln!(
                out,
                "  {:<6} {:<28} {:>8}  {}",
                f.id,
                f.original_name,
                format_size(f.size),
                f.href(api_base)
            )?;
        }
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} file(s)", files.len())?;
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
