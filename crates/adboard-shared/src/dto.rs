//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Body of `POST /api/advertisements`.
///
/// `status` stays a string here so an unknown value is reported as a
/// validation error rather than a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PUT /api/advertisements/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplaceAdvertisementRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PATCH /api/advertisements/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchAdvertisementRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query string of `GET /api/advertisements`. Values are parsed by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvertisementListQuery {
    pub status: Option<String>,
    pub creator: Option<String>,
    pub created_at_after: Option<String>,
    pub created_at_before: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Resolved owner of an advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorResponse {
    pub id: Uuid,
    pub email: String,
}

/// An advertisement as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertisementResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub creator: CreatorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
