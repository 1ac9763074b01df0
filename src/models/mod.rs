// src/models/mod.rs

pub mod book;
pub mod user;
