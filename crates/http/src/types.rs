//! Wire types shared by the console backend and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Login credentials submitted to the token endpoint.
///
/// The backend expects `username`/`password` field names.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "username")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Token endpoint response.
///
/// Both fields are optional here so a malformed response can be told apart
/// from a transport failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPair {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh endpoint response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshedToken {
    #[serde(default)]
    pub access: Option<String>,
}

/// Console user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    DataScientist,
    MarketingManager,
    User,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::DataScientist => "data_scientist",
            Self::MarketingManager => "marketing_manager",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "data_scientist" => Ok(Self::DataScientist),
            "marketing_manager" => Ok(Self::MarketingManager),
            "user" => Ok(Self::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Profile of the logged-in console user.
///
/// Serialized in camelCase; snake_case field names from the backend are
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "first_name")]
    pub first_name: String,
    #[serde(default, alias = "last_name")]
    pub last_name: String,
    pub role: Role,
    #[serde(default = "default_active", alias = "is_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, alias = "last_login", skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// Console business types

/// A customer tracked by the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub churn_risk: f64,
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub last_contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnPrediction {
    pub client_id: u64,
    pub probability: f64,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysis {
    pub client_id: u64,
    pub sentiment: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRequest<'a> {
    pub client_id: u64,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest<'a> {
    pub client_id: u64,
    pub subject: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest<'a> {
    pub client_id: u64,
    pub message: &'a str,
}

/// Fields an administrator sets when creating or editing a console user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
}

impl From<&UserProfile> for UserForm {
    fn from(user: &UserProfile) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_use_backend_field_names() {
        let creds = Credentials::new("alice", "hunter2");
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(value, json!({"username": "alice", "password": "hunter2"}));
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_profile_accepts_snake_case_fields() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "username": "mkt",
            "email": "mkt@example.com",
            "first_name": "Marie",
            "last_name": "Curie",
            "role": "marketing_manager",
            "is_active": false,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(profile.role, Role::MarketingManager);
        assert_eq!(profile.first_name, "Marie");
        assert!(!profile.is_active);
        assert!(profile.created_at.is_some());
        assert_eq!(profile.display_name(), "Marie Curie");
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 1,
            "username": "root",
            "role": "admin"
        }))
        .unwrap();
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["firstName"], "");
        assert_eq!(value["isActive"], true);
        assert!(value.get("avatar").is_none());
        assert_eq!(profile.display_name(), "root");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("data_scientist".parse::<Role>().unwrap(), Role::DataScientist);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("superuser".parse::<Role>().is_err());
    }
}
