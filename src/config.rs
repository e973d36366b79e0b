// src/config.rs

use std::{env, net::SocketAddr};

use dotenvy::dotenv;

use crate::{error::AppError, services::comments::DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Shared HS256 secret of the identity provider.
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    /// Deepest reply level expanded by a thread fetch.
    pub thread_max_depth: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("Invalid BIND_ADDR: {}", e)))?;

        let thread_max_depth = match env::var("THREAD_MAX_DEPTH") {
            Ok(raw) => raw.parse().map_err(|e| {
                AppError::InternalServerError(format!("Invalid THREAD_MAX_DEPTH: {}", e))
            })?,
            Err(_) => DEFAULT_MAX_DEPTH,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            thread_max_depth,
            cors_origins,
        })
    }
}
