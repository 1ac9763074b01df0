// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::book::BookResponse;

/// A login credential as persisted in `credentials.json`.
///
/// Only the store ever serializes this record; it is never returned to
/// clients, so the hash stays on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique username (case-insensitive).
    pub username: String,

    /// Argon2 password hash.
    #[serde(rename = "password")]
    pub password_hash: String,

    pub email: String,
    pub description: Option<String>,
    pub zip_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A member profile as persisted in `members.json` and shown in the
/// members directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Links the profile to its credential record.
    pub username: String,
    /// One of the fixed avatar set, picked at random at registration.
    pub profile_image: String,
    pub is_administrator: bool,
    pub zip_code: Option<String>,
    pub description: Option<String>,
}

/// The fixed avatar set new members draw from.
pub const AVATAR_IMAGES: [&str; 11] = [
    "Avatar1.jpg",
    "Avatar2.jpg",
    "Avatar3.jpg",
    "Avatar4.jpg",
    "Avatar5.jpg",
    "Avatar6.jpg",
    "Avatar7.jpg",
    "Avatar8.jpg",
    "Avatar9.jpg",
    "Avatar10.jpg",
    "Avatar11.jpg",
];

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, max = 30, message = "Phone is required."))]
    pub phone: String,
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    pub zip_code: Option<String>,
    pub description: Option<String>,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub member: Member,
    pub created_at: DateTime<Utc>,
    pub owned: Vec<BookResponse>,
    pub rented: Vec<BookResponse>,
}
