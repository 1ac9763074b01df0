// src/handlers/members.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{book::BookResponse, user::ProfileResponse},
    store::{books::BookStore, members::MemberStore},
    utils::jwt::Claims,
};

/// The members directory. Login-gated like the original page.
pub async fn list_members(
    State(members): State<Arc<MemberStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(members.members()))
}

/// Current member's profile plus their owned and rented books.
pub async fn get_profile(
    State(members): State<Arc<MemberStore>>,
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let member = members
        .find_member(&claims.sub)
        .ok_or(AppError::NotFound("Member not found".to_string()))?;
    let credential = members
        .find_credential(&claims.sub)
        .ok_or(AppError::NotFound("Member not found".to_string()))?;

    let owned = books
        .by_owner(&claims.sub)
        .into_iter()
        .map(BookResponse::from)
        .collect();
    let rented = books
        .rented_by(&claims.sub)
        .into_iter()
        .map(BookResponse::from)
        .collect();

    Ok(Json(ProfileResponse {
        member,
        created_at: credential.created_at,
        owned,
        rented,
    }))
}
