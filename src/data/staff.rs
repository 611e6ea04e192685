use crate::data::id::Id;
use serde::{Deserialize, Serialize};

/// The signed-in account returned by `POST /auth/login`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Employee {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        match self.surname.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(surname) => format!("{} {}", self.name, surname),
            None => self.name.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub license: String,
    pub notes: String,
}

/// Shortest password the backend accepts when an employee is edited.
pub const MIN_PASSWORD_LEN: usize = 6;

/// `PATCH /employees/:id` body. Every profile field is resent; the password
/// only travels when it is long enough to be a real change.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpdateEmployee {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub license: String,
    pub notes: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UpdateEmployee {
    pub fn new(
        name: &str,
        surname: &str,
        email: &str,
        license: &str,
        notes: &str,
        role: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        UpdateEmployee {
            name: name.trim().to_string(),
            surname: surname.trim().to_string(),
            email: email.trim().to_string(),
            license: license.to_string(),
            notes: notes.to_string(),
            role: role.unwrap_or("driver").to_string(),
            password: password
                .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
                .map(str::to_string),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: Id,
    /// Brand and model share this one field, e.g. "Iveco Daily".
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub plate: String,
}

impl Vehicle {
    pub fn brand_and_model(&self) -> (String, String) {
        split_brand_model(&self.model)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub model: String,
    pub plate: String,
}

impl NewVehicle {
    pub fn new(brand: &str, model: &str, plate: &str) -> Self {
        NewVehicle {
            model: join_brand_model(brand, model),
            plate: plate.trim().to_string(),
        }
    }
}

/// `PATCH /vehicles/:id` body. Same shape as the create body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpdateVehicle {
    pub model: String,
    pub plate: String,
}

impl UpdateVehicle {
    pub fn new(brand: &str, model: &str, plate: &str) -> Self {
        UpdateVehicle {
            model: join_brand_model(brand, model),
            plate: plate.trim().to_string(),
        }
    }
}

/// First word is the brand, the rest is the model.
pub fn split_brand_model(full: &str) -> (String, String) {
    let mut parts = full.split_whitespace();
    let brand = parts.next().unwrap_or_default().to_string();
    let model = parts.collect::<Vec<_>>().join(" ");
    (brand, model)
}

pub fn join_brand_model(brand: &str, model: &str) -> String {
    [brand.trim(), model.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
