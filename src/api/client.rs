use crate::api::error::{ApiError, error_message};
use crate::data::{
    AppSettings, DecodedRoutes, Employee, FileKind, Id, NewEmployee, NewRoute, NewVehicle, Route,
    RouteFile, Session, UpdateEmployee, UpdateVehicle, User, Vehicle, decode_routes,
};
use reqwest::blocking::{Client, RequestBuilder, multipart};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Thin JSON client for the dashboard backend.
///
/// Holds no state besides the bearer token it was built with; callers
/// decide what to do with results.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &AppSettings, session: &Session) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(ApiClient {
            http,
            base_url: settings.api_base().to_string(),
            token: session.token().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_token(&self) -> Result<(), ApiError> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(ApiError::NotLoggedIn),
        }
    }

    /// Sends the request and returns the raw body of a 2xx response.
    fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        debug!(method, path, "api request");
        let response = self.authorized(request).header(ACCEPT, "application/json").send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            debug!(method, path, status = status.as_u16(), %message, "api request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, ApiError> {
        serde_json::from_slice(body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute("GET", path, self.http.get(self.url(path)))?;
        Self::decode(path, &body)
    }

    fn post_json<B: Serialize>(&self, path: &str, payload: &B) -> Result<Vec<u8>, ApiError> {
        self.execute("POST", path, self.http.post(self.url(path)).json(payload))
    }

    fn patch_json<B: Serialize>(&self, path: &str, payload: &B) -> Result<Vec<u8>, ApiError> {
        self.execute("PATCH", path, self.http.patch(self.url(path)).json(payload))
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute("DELETE", path, self.http.delete(self.url(path)))?;
        Ok(())
    }

    // ── auth ──────────────────────────────────────────────────────────────────

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = self.post_json("/auth/login", &LoginRequest { email, password })?;
        let response: LoginResponse = Self::decode("/auth/login", &body)?;
        info!(email, "logged in");
        Ok(response)
    }

    // ── routes ────────────────────────────────────────────────────────────────

    /// Full route list. Malformed records are dropped and reported in
    /// `DecodedRoutes::rejected` instead of failing the whole fetch.
    pub fn list_routes(&self) -> Result<DecodedRoutes, ApiError> {
        self.require_token()?;
        let items: Vec<serde_json::Value> = self.get_json("/routes")?;
        let decoded = decode_routes(items);
        info!(
            routes = decoded.routes.len(),
            rejected = decoded.rejected.len(),
            "routes fetched"
        );
        Ok(decoded)
    }

    /// Returns the created route when the server echoes it back.
    pub fn create_route(&self, route: &NewRoute) -> Result<Option<Route>, ApiError> {
        self.require_token()?;
        let body = self.post_json("/routes", route)?;
        info!(driver = %route.driver, stops = route.stops.len(), "route created");
        Ok(serde_json::from_slice::<Route>(&body).ok())
    }

    pub fn delete_route(&self, route_id: &Id) -> Result<(), ApiError> {
        self.require_token()?;
        self.delete(&format!("/routes/{route_id}"))?;
        info!(%route_id, "route deleted");
        Ok(())
    }

    // ── delivery-proof files ──────────────────────────────────────────────────

    pub fn list_files(&self, route_id: &Id) -> Result<Vec<RouteFile>, ApiError> {
        self.require_token()?;
        self.get_json(&format!("/routes/{route_id}/files"))
    }

    pub fn upload_files(
        &self,
        route_id: &Id,
        kind: FileKind,
        paths: &[PathBuf],
    ) -> Result<(), ApiError> {
        self.require_token()?;
        let mut form = multipart::Form::new();
        for path in paths {
            form = form.file("files", path).map_err(|source| ApiError::Io {
                path: path.clone(),
                source,
            })?;
        }
        let path = format!("/routes/{route_id}/files");
        let request = self
            .http
            .post(self.url(&path))
            .query(&[("type", kind.query_value())])
            .multipart(form);
        self.execute("POST", &path, request)?;
        info!(%route_id, %kind, files = paths.len(), "files uploaded");
        Ok(())
    }

    pub fn delete_file(&self, route_id: &Id, file_id: &Id) -> Result<(), ApiError> {
        self.require_token()?;
        self.delete(&format!("/routes/{route_id}/files/{file_id}"))
    }

    // ── employees / vehicles ──────────────────────────────────────────────────

    pub fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.require_token()?;
        self.get_json("/employees")
    }

    pub fn create_employee(&self, employee: &NewEmployee) -> Result<(), ApiError> {
        self.require_token()?;
        self.post_json("/employees", employee)?;
        Ok(())
    }

    pub fn update_employee(&self, id: &Id, employee: &UpdateEmployee) -> Result<(), ApiError> {
        self.require_token()?;
        self.patch_json(&format!("/employees/{id}"), employee)?;
        info!(%id, password = employee.password.is_some(), "employee updated");
        Ok(())
    }

    pub fn delete_employee(&self, id: &Id) -> Result<(), ApiError> {
        self.require_token()?;
        self.delete(&format!("/employees/{id}"))
    }

    pub fn list_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        self.require_token()?;
        self.get_json("/vehicles")
    }

    pub fn create_vehicle(&self, vehicle: &NewVehicle) -> Result<(), ApiError> {
        self.require_token()?;
        self.post_json("/vehicles", vehicle)?;
        Ok(())
    }

    pub fn update_vehicle(&self, id: &Id, vehicle: &UpdateVehicle) -> Result<(), ApiError> {
        self.require_token()?;
        self.patch_json(&format!("/vehicles/{id}"), vehicle)?;
        info!(%id, "vehicle updated");
        Ok(())
    }

    pub fn delete_vehicle(&self, id: &Id) -> Result<(), ApiError> {
        self.require_token()?;
        self.delete(&format!("/vehicles/{id}"))
    }
}
