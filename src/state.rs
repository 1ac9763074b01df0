// src/state.rs

use crate::config::Config;
use crate::store::{books::BookStore, members::MemberStore};
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub books: Arc<BookStore>,
    pub members: Arc<MemberStore>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<BookStore> {
    fn from_ref(state: &AppState) -> Self {
        state.books.clone()
    }
}

impl FromRef<AppState> for Arc<MemberStore> {
    fn from_ref(state: &AppState) -> Self {
        state.members.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
