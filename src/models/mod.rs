// src/models/mod.rs

pub mod comment;
pub mod post;
pub mod reaction;
pub mod user;

/// Primary key type shared by every table (`BIGSERIAL`).
pub type Id = i64;
