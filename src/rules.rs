// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Category rules: extension to folder-name classification

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The fixed set of category folders. Every extension maps to exactly
/// one category; anything unrecognized (including no extension) is
/// `Others`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Images,
    Documents,
    Archives,
    Audio,
    Videos,
    Others,
}

impl Category {
    /// Classify a file extension. Matching is case-insensitive; the
    /// mapping is total and depends only on the given string.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "tiff" | "bmp" | "heic" => Category::Images,
            "pdf" | "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" | "txt" => {
                Category::Documents
            }
            "zip" | "rar" | "7z" | "tar" | "gz" => Category::Archives,
            "mp3" | "wav" | "m4a" | "flac" => Category::Audio,
            "mp4" | "mov" | "avi" | "mkv" => Category::Videos,
            _ => Category::Others,
        }
    }

    /// Folder name for this category inside the target directory.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::Audio => "Audio",
            Category::Videos => "Videos",
            Category::Others => "Others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Classify a path by its final extension. Entries without an
/// extension (dotless names, directories) classify as `Others`.
pub fn classify_path(path: &Path) -> Category {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => Category::from_extension(ext),
        None => Category::Others,
    }
}
