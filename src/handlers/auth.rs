// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AVATAR_IMAGES, Credential, LoginRequest, RegisterRequest},
    store::members::{MemberStore, NewMember, RegisterOutcome},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new member.
///
/// Hashes the password using Argon2 before storing it, assigns a random
/// avatar from the fixed set, and creates the credential and profile
/// records. Returns 201 Created with the member profile, or 409 when the
/// username is taken (comparison is case-insensitive).
pub async fn register(
    State(members): State<Arc<MemberStore>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let profile_image = AVATAR_IMAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(AVATAR_IMAGES[0])
        .to_string();

    let credential = Credential {
        username: payload.username.clone(),
        password_hash: hashed_password,
        email: payload.email.clone(),
        description: payload.description.clone(),
        zip_code: payload.zip_code.clone(),
        created_at: Utc::now(),
    };
    let profile = NewMember {
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        profile_image,
        is_administrator: false,
        zip_code: payload.zip_code,
        description: payload.description,
    };

    match members.register(credential, profile)? {
        RegisterOutcome::Registered(member) => Ok((StatusCode::CREATED, Json(member))),
        RegisterOutcome::DuplicateUsername => Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            payload.username
        ))),
    }
}

/// Authenticates a member and returns a JWT token.
///
/// Verifies the password against the stored Argon2 hash. A missing user
/// and a wrong password produce the same 401.
pub async fn login(
    State(members): State<Arc<MemberStore>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let credential = members
        .find_credential(&payload.username)
        .ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    let is_valid = verify_password(&payload.password, &credential.password_hash)?;
    if !is_valid {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let admin = members
        .find_member(&credential.username)
        .map(|m| m.is_administrator)
        .unwrap_or(false);

    let token = sign_jwt(
        &credential.username,
        admin,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": credential.username,
    })))
}
