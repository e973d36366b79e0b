// src/services/mod.rs

pub mod comments;
pub mod reactions;
