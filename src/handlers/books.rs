// src/handlers/books.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::book::{
        Book, BookListParams, BookResponse, BookStats, CreateBookRequest, RateRequest,
        UpdateBookRequest,
    },
    store::books::{BookStore, RateOutcome, RentOutcome, ReturnOutcome, UpdateOutcome},
    utils::jwt::Claims,
};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// List books, filtered and sorted by title.
///
/// `title` and `author` match as case-insensitive substrings, `genre`
/// matches exactly (case-insensitive), `year` exactly; `available=true`
/// restricts to books with at least one free copy.
pub async fn list_books(
    State(books): State<Arc<BookStore>>,
    Query(params): Query<BookListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut result: Vec<Book> = books
        .all()
        .into_iter()
        .filter(|b| !params.available.unwrap_or(false) || b.is_available())
        .filter(|b| {
            params
                .genre
                .as_deref()
                .filter(|g| !g.trim().is_empty())
                .is_none_or(|g| {
                    b.genre
                        .as_deref()
                        .is_some_and(|bg| bg.eq_ignore_ascii_case(g))
                })
        })
        .filter(|b| {
            params
                .author
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .is_none_or(|a| contains_ci(&b.author, a))
        })
        .filter(|b| {
            params
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .is_none_or(|t| contains_ci(&b.title, t))
        })
        .filter(|b| params.year.filter(|y| *y > 0).is_none_or(|y| b.year == Some(y)))
        .collect();

    result.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));

    let result: Vec<BookResponse> = result.into_iter().map(BookResponse::from).collect();
    Ok(Json(result))
}

/// Distinct genres across the collection, for the filter dropdown.
pub async fn list_genres(
    State(books): State<Arc<BookStore>>,
) -> Result<impl IntoResponse, AppError> {
    let mut genres: Vec<String> = Vec::new();
    for book in books.all() {
        if let Some(genre) = book.genre.as_deref() {
            let genre = genre.trim();
            if !genre.is_empty() && !genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                genres.push(genre.to_string());
            }
        }
    }
    genres.sort_by_key(|g| g.to_lowercase());
    Ok(Json(genres))
}

/// Front-page statistics: totals plus the six newest books.
pub async fn stats(State(books): State<Arc<BookStore>>) -> Result<impl IntoResponse, AppError> {
    let all = books.all();
    let total = all.len();
    let available = all.iter().filter(|b| b.is_available()).count();

    let mut latest = all;
    latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    latest.truncate(6);

    Ok(Json(BookStats {
        total,
        available,
        latest: latest.into_iter().map(BookResponse::from).collect(),
    }))
}

pub async fn get_book(
    State(books): State<Arc<BookStore>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Book not found".to_string()))?;
    Ok(Json(BookResponse::from(book)))
}

/// Create a book owned by the current user.
pub async fn create_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let book = Book {
        id: Uuid::new_v4(),
        title: payload.title.trim().to_string(),
        author: payload
            .author
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        year: payload.year,
        genre: payload.genre,
        description: payload.description,
        image_path: None,
        pdf_path: None,
        copies: payload.copies.max(1),
        rented_by: Vec::new(),
        created_by: claims.sub.clone(),
        created_at: Utc::now(),
        ratings: Vec::new(),
    };

    books.add(book.clone())?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// Owner-only edit. Rejects a copy count below the active-rental count.
pub async fn update_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Book not found".to_string()))?;
    if !book.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this book".to_string(),
        ));
    }

    match books.update(id, &payload)? {
        UpdateOutcome::Updated(book) => Ok(Json(BookResponse::from(book))),
        UpdateOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
        UpdateOutcome::CopiesBelowRentals(active) => Err(AppError::Conflict(format!(
            "Copy count cannot go below {}, there are active rentals",
            active
        ))),
    }
}

/// Owner-only delete. The two outcomes carry distinct messages.
pub async fn delete_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Could not delete the book".to_string()))?;
    if !book.is_owned_by(&claims.sub) && !claims.admin {
        return Err(AppError::Forbidden(
            "You do not have permission to delete this book".to_string(),
        ));
    }

    if books.remove(id)? {
        Ok(Json(json!({ "message": "The book has been deleted" })))
    } else {
        Err(AppError::NotFound("Could not delete the book".to_string()))
    }
}

pub async fn rent_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    match books.rent(id, &claims.sub)? {
        RentOutcome::Rented => Ok(Json(json!({ "message": "The book is now rented" }))),
        RentOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
        RentOutcome::NoCopies => Err(AppError::Conflict("The book is not available".to_string())),
        RentOutcome::AlreadyRenting => Err(AppError::Conflict(
            "You are already renting this book".to_string(),
        )),
    }
}

pub async fn return_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    match books.hand_back(id, &claims.sub)? {
        ReturnOutcome::Returned => Ok(Json(json!({ "message": "The book has been returned" }))),
        ReturnOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
        ReturnOutcome::NotRenting => Err(AppError::Conflict(
            "You have no active rental for this book".to_string(),
        )),
    }
}

/// Add or overwrite the current renter's rating.
pub async fn rate_book(
    State(books): State<Arc<BookStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateRequest>,
) -> Result<impl IntoResponse, AppError> {
    match books.rate(id, &claims.sub, payload.stars, payload.comment)? {
        RateOutcome::Rated(book) => Ok(Json(BookResponse::from(book))),
        RateOutcome::NotFound => Err(AppError::NotFound("Book not found".to_string())),
        RateOutcome::NotRenter => Err(AppError::Forbidden(
            "You can only rate books you are renting".to_string(),
        )),
    }
}

/// Owner-only cover upload. The image lands under the public uploads root
/// and its server-relative path is stored on the book.
pub async fn upload_image(
    State(books): State<Arc<BookStore>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Book not found".to_string()))?;
    if !book.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this book".to_string(),
        ));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .ok_or(AppError::BadRequest("Missing file field".to_string()))?;

    let ext = field
        .file_name()
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let dir = config.uploads_dir().join("books");
    tokio::fs::create_dir_all(&dir).await?;
    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    tokio::fs::write(dir.join(&file_name), &data).await?;

    let path = format!("/uploads/books/{}", file_name);
    if !books.set_image_path(id, path.clone())? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }
    Ok(Json(json!({ "image_path": path })))
}

/// Owner-only PDF upload. Only `.pdf` is accepted; the file lands under
/// the private root and is only reachable through the gated download.
pub async fn upload_pdf(
    State(books): State<Arc<BookStore>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Book not found".to_string()))?;
    if !book.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this book".to_string(),
        ));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .ok_or(AppError::BadRequest("Missing file field".to_string()))?;

    let is_pdf = field
        .file_name()
        .map(|n| n.to_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(AppError::BadRequest("Only PDF files are allowed".to_string()));
    }
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let dir = config.private_dir().join("books");
    tokio::fs::create_dir_all(&dir).await?;
    let file_name = format!("{}.pdf", Uuid::new_v4());
    tokio::fs::write(dir.join(&file_name), &data).await?;

    let path = format!("private/books/{}", file_name);
    if !books.set_pdf_path(id, path.clone())? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }
    Ok(Json(json!({ "pdf_path": path })))
}

/// Gated PDF download: only the owner or an active renter may fetch it.
pub async fn download_pdf(
    State(books): State<Arc<BookStore>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let book = books
        .get(id)
        .ok_or(AppError::NotFound("Book not found".to_string()))?;

    let allowed = book.is_owned_by(&claims.sub) || book.is_rented_by(&claims.sub);
    if !allowed {
        return Err(AppError::Forbidden(
            "You do not have access to download this book".to_string(),
        ));
    }

    let pdf_path = book
        .pdf_path
        .as_deref()
        .ok_or(AppError::NotFound("This book has no attached PDF".to_string()))?;

    let abs = config.data_dir.join(pdf_path);
    let data = tokio::fs::read(&abs)
        .await
        .map_err(|_| AppError::NotFound("The PDF file was not found".to_string()))?;

    let file_name = if book.title.trim().is_empty() {
        "book.pdf".to_string()
    } else {
        format!("{}.pdf", book.title.trim())
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
            ),
        ],
        data,
    ))
}
