mod api;
mod calc;
mod cmd;
mod data;
mod ui;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use cmd::Context;
use data::{AppSettings, FileKind};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "routeboard.log";

#[derive(Parser)]
#[command(name = "routeboard", about = "delivery route calendar for fleet admins")]
struct Cli {
    /// Path to the data directory holding config.yaml and the session (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    /// Base URL of the routes API (overrides config.yaml)
    #[arg(long, env = "ROUTEBOARD_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.yaml into the data directory
    Init,
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List routes, pending by default
    Routes {
        /// Case-insensitive match on code, driver or vehicle
        #[arg(short, long, default_value = "")]
        search: String,
        /// Show completed routes instead of pending ones
        #[arg(short, long)]
        completed: bool,
        /// Only routes starting on this local day (YYYY-MM-DD)
        #[arg(short, long)]
        day: Option<String>,
    },
    /// Print the month grid with per-day route counts
    Month {
        /// Month as YYYY-MM (default: current month)
        month: Option<String>,
        #[arg(short, long)]
        completed: bool,
    },
    /// Create a route
    NewRoute {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        vehicle: String,
        /// Start time, RFC 3339 or local "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        start: Option<String>,
        /// Stop as "name;address[;notes[;eta]]", repeatable
        #[arg(long = "stop")]
        stops: Vec<String>,
    },
    /// Delete a route
    DeleteRoute { id: String },
    /// List the delivery-proof files of a route
    Files { route_id: String },
    /// Upload delivery-proof files to a route
    Upload {
        route_id: String,
        /// invoice, receipt or other
        #[arg(short, long)]
        kind: FileKind,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete one file from a route
    DeleteFile { route_id: String, file_id: String },
    /// List employees
    Employees,
    /// Add an employee
    AddEmployee {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        license: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Replace an employee's profile; the password changes only when given with 6+ characters
    EditEmployee {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        license: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Role to store (default: driver)
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove an employee
    RemoveEmployee { id: String },
    /// List vehicles
    Vehicles,
    /// Add a vehicle
    AddVehicle {
        #[arg(long)]
        brand: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long)]
        plate: String,
    },
    /// Change a vehicle's brand, model and plate
    EditVehicle {
        id: String,
        #[arg(long)]
        brand: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        plate: String,
    },
    /// Remove a vehicle
    RemoveVehicle { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Absolute so the log file and session stay put if the cwd changes.
    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };

    let settings = AppSettings::load_from(&data_dir)?.with_api_url(cli.api_url);
    init_logging(&settings, &data_dir, cli.command.is_none())?;

    let ctx = Context::new(data_dir, settings);
    match cli.command {
        None => cmd::root::run(&ctx),
        Some(Commands::Init) => cmd::init::run(&ctx),
        Some(Commands::Login { email, password }) => cmd::login::run_login(&ctx, &email, &password),
        Some(Commands::Logout) => cmd::login::run_logout(&ctx),
        Some(Commands::Routes { search, completed, day }) => {
            cmd::routes::run(&ctx, &search, completed, day.as_deref())
        }
        Some(Commands::Month { month, completed }) => {
            cmd::month::run(&ctx, month.as_deref(), completed)
        }
        Some(Commands::NewRoute { driver, vehicle, start, stops }) => {
            cmd::route_edit::run_new_route(&ctx, &driver, &vehicle, start.as_deref(), &stops)
        }
        Some(Commands::DeleteRoute { id }) => cmd::route_edit::run_delete_route(&ctx, &id),
        Some(Commands::Files { route_id }) => cmd::files::run_list(&ctx, &route_id),
        Some(Commands::Upload { route_id, kind, paths }) => {
            cmd::files::run_upload(&ctx, &route_id, kind, &paths)
        }
        Some(Commands::DeleteFile { route_id, file_id }) => {
            cmd::files::run_delete(&ctx, &route_id, &file_id)
        }
        Some(Commands::Employees) => cmd::staff::run_employees(&ctx),
        Some(Commands::AddEmployee { name, surname, email, password, license, notes }) => {
            cmd::staff::run_add_employee(
                &ctx,
                data::NewEmployee { name, surname, email, password, license, notes },
            )
        }
        Some(Commands::EditEmployee {
            id,
            name,
            surname,
            email,
            license,
            notes,
            role,
            password,
        }) => cmd::staff::run_edit_employee(
            &ctx,
            &id,
            data::UpdateEmployee::new(
                &name,
                &surname,
                &email,
                &license,
                &notes,
                role.as_deref(),
                password.as_deref(),
            ),
        ),
        Some(Commands::RemoveEmployee { id }) => cmd::staff::run_remove_employee(&ctx, &id),
        Some(Commands::Vehicles) => cmd::staff::run_vehicles(&ctx),
        Some(Commands::AddVehicle { brand, model, plate }) => {
            cmd::staff::run_add_vehicle(&ctx, &brand, &model, &plate)
        }
        Some(Commands::EditVehicle { id, brand, model, plate }) => {
            cmd::staff::run_edit_vehicle(&ctx, &id, &brand, &model, &plate)
        }
        Some(Commands::RemoveVehicle { id }) => cmd::staff::run_remove_vehicle(&ctx, &id),
    }
}

/// `RUST_LOG` wins over the configured filter. The interactive calendar owns
/// the terminal, so it logs to a file in the data directory instead of stderr.
fn init_logging(settings: &AppSettings, data_dir: &Path, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if interactive {
        let path = log_path(data_dir);
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_calendar() {
        let cli = Cli::try_parse_from(["routeboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, PathBuf::from("./config"));
    }

    #[test]
    fn test_cli_parses_upload_kind_and_paths() {
        let cli = Cli::try_parse_from([
            "routeboard", "upload", "12", "--kind", "receipt", "a.jpg", "b.jpg",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Upload { route_id, kind, paths }) => {
                assert_eq!(route_id, "12");
                assert_eq!(kind, FileKind::Receipt);
                assert_eq!(paths.len(), 2);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        let res = Cli::try_parse_from(["routeboard", "upload", "1", "--kind", "photo", "a.jpg"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_repeatable_stops() {
        let cli = Cli::try_parse_from([
            "routeboard", "new-route", "--driver", "Ana", "--vehicle", "Iveco",
            "--stop", "Carga;Nave 4", "--stop", "Cliente;C/ Sol 2;Llamar",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::NewRoute { stops, start, .. }) => {
                assert_eq!(stops.len(), 2);
                assert!(start.is_none());
            }
            _ => panic!("expected new-route"),
        }
    }

    #[test]
    fn test_cli_edit_employee_password_optional() {
        let cli = Cli::try_parse_from([
            "routeboard", "edit-employee", "7", "--name", "Ana", "--email", "ana@demo.com",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::EditEmployee { id, password, role, license, .. }) => {
                assert_eq!(id, "7");
                assert!(password.is_none());
                assert!(role.is_none());
                assert_eq!(license, "");
            }
            _ => panic!("expected edit-employee"),
        }
    }

    #[test]
    fn test_cli_edit_vehicle_needs_all_fields() {
        assert!(Cli::try_parse_from(["routeboard", "edit-vehicle", "3", "--brand", "Ford"]).is_err());
        let cli = Cli::try_parse_from([
            "routeboard", "edit-vehicle", "3", "--brand", "Ford", "--model", "Transit", "--plate", "X",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::EditVehicle { .. })));
    }

    #[test]
    fn test_log_path_in_data_dir() {
        assert_eq!(log_path(Path::new("/tmp/rb")), PathBuf::from("/tmp/rb/routeboard.log"));
    }
}
