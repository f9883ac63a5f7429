// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Taxis: Extension-Based Directory Organizer
//!
//! Moves the top-level files of a user-granted directory into category
//! subfolders (Images, Documents, Archives, Audio, Videos, Others)
//! chosen from each file's extension. Access to the target directory is
//! a persisted, revocable grant that survives process restarts.

pub mod config;
pub mod engine;
pub mod error;
pub mod grant;
pub mod rules;

pub use config::AppConfig;
pub use error::{Result, TaxisError};
