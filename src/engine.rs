// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Organize engine: classify and move top-level directory entries
//!
//! One `organize` run enumerates the direct children of the granted
//! directory and moves each into its category subfolder. Failures on
//! one entry never abort the run; directory-level failures (access,
//! enumeration) abort it before anything is moved.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::grant::DirectoryReference;
use crate::rules::{classify_path, Category};
use crate::{Result, TaxisError};

/// One directory entry planned for relocation.
#[derive(Debug)]
pub struct FileEntry {
    pub source: PathBuf,
    pub category: Category,
    pub dest_dir: PathBuf,
    pub dest_path: PathBuf,
}

impl FileEntry {
    /// Plan the move for a single child of the target directory.
    /// Returns `None` for entries that carry no base name.
    pub fn plan(source: PathBuf, target: &Path) -> Option<Self> {
        let name = source.file_name()?.to_os_string();
        let category = classify_path(&source);
        let dest_dir = target.join(category.folder_name());
        let dest_path = dest_dir.join(&name);
        Some(Self { source, category, dest_dir, dest_path })
    }
}

/// Outcome of one entry: moved, or failed with a reason.
#[derive(Debug, Serialize)]
pub struct EntryOutcome {
    pub source: PathBuf,
    pub category: Category,
    pub destination: PathBuf,
    pub moved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one organize run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub started: DateTime<Utc>,
    pub processed: usize,
    pub moved: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub dry_run: bool,
    pub entries: Vec<EntryOutcome>,
}

impl Report {
    fn new(dry_run: bool) -> Self {
        Self {
            started: Utc::now(),
            processed: 0,
            moved: 0,
            failed: 0,
            cancelled: false,
            dry_run,
            entries: Vec::new(),
        }
    }
}

/// The organize engine. At most one run executes at a time; a second
/// concurrent call fails fast with `RunInProgress`.
pub struct OrganizeEngine {
    guard: Mutex<()>,
    dry_run: bool,
}

impl OrganizeEngine {
    pub fn new(dry_run: bool) -> Self {
        Self { guard: Mutex::new(()), dry_run }
    }

    /// Run one organize pass over the referenced directory. The cancel
    /// channel is checked before each entry; a cancelled run returns
    /// the partial report with `cancelled` set.
    pub fn organize(
        &self,
        reference: &DirectoryReference,
        cancel: &watch::Receiver<bool>,
    ) -> Result<Report> {
        let _run = self.guard.try_lock().map_err(|_| TaxisError::RunInProgress)?;

        let _scope = reference.acquire()?;
        let target = reference.path();
        info!("Organizing {:?}", target);

        let children: Vec<PathBuf> = std::fs::read_dir(target)
            .map_err(|e| TaxisError::Enumeration(format!("{}: {}", target.display(), e)))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();

        let mut report = Report::new(self.dry_run);

        for child in children {
            if *cancel.borrow() {
                info!("Run cancelled before {:?}", child);
                report.cancelled = true;
                break;
            }

            // Category folders created by earlier runs stay in place,
            // so a pass over an organized directory moves nothing.
            if child.is_dir() && is_category_folder(&child) {
                debug!("Skipping category folder {:?}", child);
                continue;
            }

            let entry = match FileEntry::plan(child, target) {
                Some(entry) => entry,
                None => continue,
            };

            report.processed += 1;
            let outcome = self.move_entry(entry);
            if outcome.moved {
                report.moved += 1;
            } else if outcome.error.is_some() {
                report.failed += 1;
            }
            report.entries.push(outcome);
        }

        info!(
            "Run finished: {} processed, {} moved, {} failed{}",
            report.processed,
            report.moved,
            report.failed,
            if report.cancelled { " (cancelled)" } else { "" }
        );

        Ok(report)
    }

    /// Move one planned entry, localizing any failure to its outcome.
    fn move_entry(&self, entry: FileEntry) -> EntryOutcome {
        let FileEntry { source, category, dest_dir, dest_path } = entry;

        if self.dry_run {
            info!("DRY RUN: would move {:?} to {:?}", source, dest_path);
            return EntryOutcome {
                source,
                category,
                destination: dest_path,
                moved: false,
                error: None,
            };
        }

        let result = ensure_dir(&dest_dir).and_then(|_| {
            // Rename's behavior on an existing destination varies by
            // platform and target type; fail deterministically instead.
            if dest_path.exists() {
                return Err(TaxisError::FileSystem(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("destination already exists: {}", dest_path.display()),
                )));
            }
            std::fs::rename(&source, &dest_path)?;
            Ok(())
        });

        match result {
            Ok(()) => {
                info!("Moved {:?} to {}", source.file_name().unwrap_or_default(), category);
                EntryOutcome {
                    source,
                    category,
                    destination: dest_path,
                    moved: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Failed to move {:?}: {}", source, e);
                EntryOutcome {
                    source,
                    category,
                    destination: dest_path,
                    moved: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Create a destination directory, intermediate segments included.
/// Idempotent when it already exists as a directory.
fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn is_category_folder(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            [
                Category::Images,
                Category::Documents,
                Category::Archives,
                Category::Audio,
                Category::Videos,
                Category::Others,
            ]
            .iter()
            .any(|c| c.folder_name() == name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn reference_for(dir: &TempDir) -> DirectoryReference {
        DirectoryReference::new(dir.path().to_path_buf())
    }

    fn no_cancel() -> watch::Receiver<bool> {
        let (_tx, rx) = watch::channel(false);
        rx
    }

    #[test]
    fn test_scenario_five_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.JPG");
        touch(dir.path(), "report.pdf");
        touch(dir.path(), "archive.tar.gz");
        touch(dir.path(), "notes");
        touch(dir.path(), "song.flac");

        let engine = OrganizeEngine::new(false);
        let report = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(report.moved, 5);
        assert_eq!(report.failed, 0);
        assert!(!report.cancelled);

        assert!(dir.path().join("Images/photo.JPG").is_file());
        assert!(dir.path().join("Documents/report.pdf").is_file());
        assert!(dir.path().join("Archives/archive.tar.gz").is_file());
        assert!(dir.path().join("Others/notes").is_file());
        assert!(dir.path().join("Audio/song.flac").is_file());

        assert!(!dir.path().join("photo.JPG").exists());
        assert!(!dir.path().join("notes").exists());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.jpg");
        touch(dir.path(), "song.mp3");

        let engine = OrganizeEngine::new(false);
        let first = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();
        assert_eq!(first.moved, 2);

        let second = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.moved, 0);
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn test_existing_destination_is_isolated_failure() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.jpg");
        touch(dir.path(), "report.pdf");
        touch(dir.path(), "song.wav");

        // Occupy photo.jpg's destination ahead of the run.
        std::fs::create_dir_all(dir.path().join("Images")).unwrap();
        std::fs::write(dir.path().join("Images/photo.jpg"), b"old").unwrap();

        let engine = OrganizeEngine::new(false);
        let report = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.moved, 2);
        assert_eq!(report.failed, 1);

        let failure = report.entries.iter().find(|e| e.error.is_some()).unwrap();
        assert_eq!(failure.source, dir.path().join("photo.jpg"));

        // The conflicting source stays put, the original is untouched.
        assert!(dir.path().join("photo.jpg").is_file());
        assert_eq!(std::fs::read(dir.path().join("Images/photo.jpg")).unwrap(), b"old");
        assert!(dir.path().join("Documents/report.pdf").is_file());
        assert!(dir.path().join("Audio/song.wav").is_file());
    }

    #[test]
    fn test_top_level_directory_goes_to_others() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("holiday-pics")).unwrap();
        touch(&dir.path().join("holiday-pics"), "beach.jpg");

        let engine = OrganizeEngine::new(false);
        let report = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.moved, 1);
        assert!(dir.path().join("Others/holiday-pics/beach.jpg").is_file());
    }

    #[test]
    fn test_dry_run_moves_nothing() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.jpg");

        let engine = OrganizeEngine::new(true);
        let report = engine.organize(&reference_for(&dir), &no_cancel()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.moved, 0);
        assert_eq!(report.failed, 0);
        assert!(report.dry_run);
        assert!(dir.path().join("photo.jpg").is_file());
        assert!(!dir.path().join("Images").exists());
    }

    #[test]
    fn test_cancelled_run_stops_before_first_entry() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photo.jpg");
        touch(dir.path(), "song.mp3");

        let (tx, rx) = watch::channel(true);
        let engine = OrganizeEngine::new(false);
        let report = engine.organize(&reference_for(&dir), &rx).unwrap();
        drop(tx);

        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert!(dir.path().join("photo.jpg").is_file());
        assert!(dir.path().join("song.mp3").is_file());
    }

    #[test]
    fn test_concurrent_run_is_rejected() {
        let dir = TempDir::new().unwrap();
        let engine = OrganizeEngine::new(false);

        let _held = engine.guard.lock().unwrap();
        match engine.organize(&reference_for(&dir), &no_cancel()) {
            Err(TaxisError::RunInProgress) => {}
            _ => panic!("expected RunInProgress"),
        }
    }

    #[test]
    fn test_missing_directory_is_access_denied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        drop(dir);

        let engine = OrganizeEngine::new(false);
        let reference = DirectoryReference::new(path);
        match engine.organize(&reference, &no_cancel()) {
            Err(TaxisError::AccessDenied(_)) => {}
            _ => panic!("expected AccessDenied"),
        }
    }

    #[test]
    fn test_scope_released_after_run() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.txt");

        let engine = OrganizeEngine::new(false);
        let reference = reference_for(&dir);
        engine.organize(&reference, &no_cancel()).unwrap();
        assert!(!reference.is_active());
    }
}
