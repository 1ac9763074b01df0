// src/models/book.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single rating left by a renter.
///
/// A user holds at most one rating per book; re-rating overwrites the
/// existing entry instead of appending a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub username: String,
    /// Star value, 1 to 5. Out-of-range input is clamped on write.
    pub stars: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A book record as persisted in `books.json`.
///
/// Availability and average rating are derived on the way out and never
/// written to disk, so they cannot drift from their source fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    /// Server-relative path to the cover image under the public uploads dir.
    pub image_path: Option<String>,
    /// Server-relative path to the gated PDF. Never served statically.
    pub pdf_path: Option<String>,
    /// Total number of physical copies, at least 1.
    pub copies: u32,
    /// One entry per active rental. A username appears at most once
    /// (case-insensitive).
    #[serde(default)]
    pub rented_by: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl Book {
    pub fn available_copies(&self) -> u32 {
        (self.copies as usize).saturating_sub(self.rented_by.len()) as u32
    }

    pub fn is_available(&self) -> bool {
        self.available_copies() > 0
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.created_by.eq_ignore_ascii_case(username)
    }

    pub fn is_rented_by(&self, username: &str) -> bool {
        self.rented_by.iter().any(|u| u.eq_ignore_ascii_case(username))
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.ratings.iter().map(|r| r.stars as u32).sum();
        Some(sum as f64 / self.ratings.len() as f64)
    }
}

/// Book detail as sent over the wire, with derived fields attached.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub available_copies: u32,
    pub is_available: bool,
    pub average_rating: Option<f64>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let available_copies = book.available_copies();
        let is_available = book.is_available();
        let average_rating = book.average_rating();
        BookResponse {
            book,
            available_copies,
            is_available,
            average_rating,
        }
    }
}

/// DTO for creating a new book.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "A book must have at least one copy."))]
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

/// DTO for an owner-only book edit. `copies` may not drop below the
/// number of active rentals.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "A book must have at least one copy."))]
    pub copies: u32,
}

/// DTO for submitting a rating. Stars are clamped, not rejected.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub stars: i32,
    pub comment: Option<String>,
}

/// Query-string filters for the book listing.
#[derive(Debug, Default, Deserialize)]
pub struct BookListParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// When true, only books with at least one free copy are returned.
    pub available: Option<bool>,
}

/// Front-page statistics.
#[derive(Debug, Serialize)]
pub struct BookStats {
    pub total: usize,
    pub available: usize,
    pub latest: Vec<BookResponse>,
}
