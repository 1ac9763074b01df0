// src/store/books.rs

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::book::{Book, Rating, UpdateBookRequest};
use crate::store::{load_or_init, persist};

/// Outcome of a rent attempt. Business negatives are data, not errors.
#[derive(Debug, PartialEq, Eq)]
pub enum RentOutcome {
    Rented,
    NotFound,
    /// Every copy is out.
    NoCopies,
    /// The user already holds an active rental on this book.
    AlreadyRenting,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned,
    NotFound,
    /// The user has no active rental to return.
    NotRenting,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Book),
    NotFound,
    /// The requested copy count is below the active-rental count.
    CopiesBelowRentals(usize),
}

#[derive(Debug)]
pub enum RateOutcome {
    Rated(Book),
    NotFound,
    /// Only current renters may rate a book.
    NotRenter,
}

/// The JSON-backed book collection.
///
/// The whole collection is rehydrated from `books.json` once at
/// construction and held in memory; every operation runs its full
/// read-decide-mutate-persist sequence inside one critical section, so a
/// rent cannot interleave with another rent between the availability check
/// and the append. File order is creation order and is preserved across
/// rewrites.
pub struct BookStore {
    file: PathBuf,
    books: Mutex<Vec<Book>>,
}

impl BookStore {
    pub fn open(file: PathBuf) -> Result<Self, AppError> {
        let books = load_or_init(&file)?;
        Ok(Self {
            file,
            books: Mutex::new(books),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Book>> {
        // A poisoned lock means a panic mid-mutation; the in-memory state is
        // still the last persisted-or-better view, so keep serving it.
        self.books.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Full collection in file order (oldest first).
    pub fn all(&self) -> Vec<Book> {
        self.lock().clone()
    }

    /// Absence is a normal outcome, not an error.
    pub fn get(&self, id: Uuid) -> Option<Book> {
        self.lock().iter().find(|b| b.id == id).cloned()
    }

    pub fn by_owner(&self, username: &str) -> Vec<Book> {
        self.lock()
            .iter()
            .filter(|b| b.is_owned_by(username))
            .cloned()
            .collect()
    }

    pub fn rented_by(&self, username: &str) -> Vec<Book> {
        self.lock()
            .iter()
            .filter(|b| b.is_rented_by(username))
            .cloned()
            .collect()
    }

    /// Appends a fully populated record. IDs are v4 UUIDs generated by the
    /// caller, unique by construction.
    pub fn add(&self, book: Book) -> Result<(), AppError> {
        let mut books = self.lock();
        books.push(book);
        persist(&self.file, &books)
    }

    /// Rents one copy for `username`.
    ///
    /// The availability check, the duplicate-renter check and the append
    /// happen under the same lock: two concurrent rents of the last copy
    /// cannot both succeed.
    pub fn rent(&self, id: Uuid, username: &str) -> Result<RentOutcome, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(RentOutcome::NotFound);
        };
        if book.is_rented_by(username) {
            return Ok(RentOutcome::AlreadyRenting);
        }
        if !book.is_available() {
            return Ok(RentOutcome::NoCopies);
        }
        book.rented_by.push(username.to_string());
        persist(&self.file, &books)?;
        Ok(RentOutcome::Rented)
    }

    /// Returns one copy. Removes exactly one case-insensitive matching
    /// entry; a second return for the same user fails cleanly.
    pub fn hand_back(&self, id: Uuid, username: &str) -> Result<ReturnOutcome, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(ReturnOutcome::NotFound);
        };
        let Some(idx) = book
            .rented_by
            .iter()
            .position(|u| u.eq_ignore_ascii_case(username))
        else {
            return Ok(ReturnOutcome::NotRenting);
        };
        book.rented_by.remove(idx);
        persist(&self.file, &books)?;
        Ok(ReturnOutcome::Returned)
    }

    /// Owner edit of the descriptive fields and the copy count.
    ///
    /// The copy-count floor is enforced here, inside the critical section,
    /// so a concurrent rent cannot slip between the check and the write.
    pub fn update(&self, id: Uuid, changes: &UpdateBookRequest) -> Result<UpdateOutcome, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        let active = book.rented_by.len();
        if (changes.copies as usize) < active {
            return Ok(UpdateOutcome::CopiesBelowRentals(active));
        }
        book.title = changes.title.trim().to_string();
        book.author = changes
            .author
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        book.year = changes.year;
        book.genre = changes.genre.clone();
        book.description = changes.description.clone();
        book.copies = changes.copies.max(1);
        let updated = book.clone();
        persist(&self.file, &books)?;
        Ok(UpdateOutcome::Updated(updated))
    }

    pub fn set_image_path(&self, id: Uuid, path: String) -> Result<bool, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        book.image_path = Some(path);
        persist(&self.file, &books)?;
        Ok(true)
    }

    pub fn set_pdf_path(&self, id: Uuid, path: String) -> Result<bool, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        book.pdf_path = Some(path);
        persist(&self.file, &books)?;
        Ok(true)
    }

    /// Add-or-overwrite a rating by a current renter.
    ///
    /// Stars are clamped into 1..=5 rather than rejected. A repeat
    /// submission replaces stars, comment and timestamp in place; the
    /// rating list never grows for the same submitter.
    pub fn rate(
        &self,
        id: Uuid,
        username: &str,
        stars: i32,
        comment: Option<String>,
    ) -> Result<RateOutcome, AppError> {
        let mut books = self.lock();
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(RateOutcome::NotFound);
        };
        if !book.is_rented_by(username) {
            return Ok(RateOutcome::NotRenter);
        }
        let stars = stars.clamp(1, 5) as u8;
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let now = Utc::now();

        match book
            .ratings
            .iter_mut()
            .find(|r| r.username.eq_ignore_ascii_case(username))
        {
            Some(existing) => {
                existing.stars = stars;
                existing.comment = comment;
                existing.created_at = now;
            }
            None => book.ratings.push(Rating {
                username: username.to_string(),
                stars,
                comment,
                created_at: now,
            }),
        }
        let updated = book.clone();
        persist(&self.file, &books)?;
        Ok(RateOutcome::Rated(updated))
    }

    /// Removes a record. Returns false when the id is unknown so the
    /// handler can report the distinct outcome.
    pub fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        let mut books = self.lock();
        let Some(idx) = books.iter().position(|b| b.id == id) else {
            return Ok(false);
        };
        books.remove(idx);
        persist(&self.file, &books)?;
        Ok(true)
    }
}
