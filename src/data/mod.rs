pub mod app_settings;
pub mod id;
pub mod persistence;
pub mod route;
pub mod route_file;
pub mod session;
pub mod staff;

pub use app_settings::AppSettings;
pub use id::Id;
pub use route::{DecodedRoutes, NewRoute, Route, Stop, decode_routes};
pub use route_file::{FileKind, RouteFile};
pub use session::Session;
pub use staff::{
    Employee, NewEmployee, NewVehicle, UpdateEmployee, UpdateVehicle, User, Vehicle,
};
