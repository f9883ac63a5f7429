// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Taxis

use thiserror::Error;

/// Result type alias for Taxis operations
pub type Result<T> = std::result::Result<T, TaxisError>;

/// Taxis error types
#[derive(Error, Debug)]
pub enum TaxisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Grant token error: {0}")]
    Token(String),

    #[error("No directory grant available")]
    NoGrant,

    #[error("Directory selection cancelled by user")]
    UserCancelled,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Directory enumeration failed: {0}")]
    Enumeration(String),

    #[error("An organize run is already in progress")]
    RunInProgress,
}
