pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod test_server;

pub use client::{ApiClient, LoginResponse};
pub use error::ApiError;

use crate::data::{DecodedRoutes, Id, RouteFile};

/// The slice of the backend the calendar view talks to. Implemented by
/// `ApiClient`; tests substitute an in-memory source.
pub trait RouteSource: Send + Sync {
    fn fetch_routes(&self) -> Result<DecodedRoutes, ApiError>;
    fn fetch_files(&self, route_id: &Id) -> Result<Vec<RouteFile>, ApiError>;
    fn remove_route(&self, route_id: &Id) -> Result<(), ApiError>;
}

impl RouteSource for ApiClient {
    fn fetch_routes(&self) -> Result<DecodedRoutes, ApiError> {
        self.list_routes()
    }

    fn fetch_files(&self, route_id: &Id) -> Result<Vec<RouteFile>, ApiError> {
        self.list_files(route_id)
    }

    fn remove_route(&self, route_id: &Id) -> Result<(), ApiError> {
        self.delete_route(route_id)
    }
}
