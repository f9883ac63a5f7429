// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Access grant store: persisted, revocable directory authorization
//!
//! A grant is an opaque token proving the user approved a target
//! directory. It is persisted under a single key so the organizer can
//! run across process restarts without re-prompting, and it is
//! re-acquired transparently when it goes stale.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::{Result, TaxisError};

/// Logical key under which the single grant is persisted.
pub const GRANT_KEY: &str = "target_directory";

/// Persistent key-value store used by the grant store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed key-value store: a JSON map with base64 values.
///
/// An absent or unparseable store file reads as empty, never as an
/// error; a grant that cannot be read is the same as no grant.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> HashMap<String, String> {
        if !self.path.exists() {
            return HashMap::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Grant store at {:?} is corrupt, treating as empty: {}", self.path, e);
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!("Failed to read grant store at {:?}: {}", self.path, e);
                HashMap::new()
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self.read_map();
        match map.get(key) {
            Some(encoded) => match BASE64.decode(encoded) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) => {
                    warn!("Stored value for '{}' is not valid base64: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), BASE64.encode(value));
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// Directory chooser presented to the user when a new grant is needed.
/// `Ok(None)` means the user cancelled the selection.
pub trait DirectoryPicker: Send + Sync {
    fn pick(&self) -> Result<Option<PathBuf>>;
}

/// Non-interactive picker seeded from a CLI flag or config value.
pub struct PresetPicker {
    target: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(target: Option<PathBuf>) -> Self {
        Self { target }
    }
}

impl DirectoryPicker for PresetPicker {
    fn pick(&self) -> Result<Option<PathBuf>> {
        match &self.target {
            Some(path) => {
                let resolved = std::fs::canonicalize(path)?;
                if !resolved.is_dir() {
                    return Err(TaxisError::Config(format!(
                        "{} is not a directory",
                        resolved.display()
                    )));
                }
                Ok(Some(resolved))
            }
            None => Ok(None),
        }
    }
}

/// Interactive picker: asks for a directory path on the terminal.
/// An empty answer cancels the selection. Refuses to prompt when
/// stdin is not a terminal (scheduled runs must rely on a persisted
/// grant or a preset directory).
pub struct PromptPicker;

impl DirectoryPicker for PromptPicker {
    fn pick(&self) -> Result<Option<PathBuf>> {
        use std::io::IsTerminal;
        if !std::io::stdin().is_terminal() {
            return Err(TaxisError::NoGrant);
        }
        eprint!("Directory to organize (empty to cancel): ");
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        let resolved = std::fs::canonicalize(answer)?;
        if !resolved.is_dir() {
            return Err(TaxisError::Config(format!(
                "{} is not a directory",
                resolved.display()
            )));
        }
        Ok(Some(resolved))
    }
}

/// Serialized body of a grant token.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    id: uuid::Uuid,
    path: PathBuf,
    created: DateTime<Utc>,
}

/// Outcome of resolving a persisted grant token.
pub enum Resolved {
    Valid(DirectoryReference),
    /// The directory behind the token no longer exists or is no
    /// longer a directory; the grant must be reacquired.
    Stale(PathBuf),
}

/// Opaque, serializable proof of consent for one directory.
pub struct AccessGrant {
    token: Vec<u8>,
}

impl AccessGrant {
    /// Mint a grant token for a user-approved directory.
    pub fn for_directory(path: &Path) -> Result<Self> {
        let payload = TokenPayload {
            id: uuid::Uuid::new_v4(),
            path: path.to_path_buf(),
            created: Utc::now(),
        };
        let token = serde_json::to_vec(&payload)?;
        Ok(Self { token })
    }

    pub fn from_token(token: Vec<u8>) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// Resolve the token into a directory reference, or report it
    /// stale when the directory has gone away.
    pub fn resolve(&self) -> Result<Resolved> {
        let payload: TokenPayload = serde_json::from_slice(&self.token)
            .map_err(|e| TaxisError::Token(format!("undecodable grant token: {}", e)))?;

        if payload.path.is_dir() {
            Ok(Resolved::Valid(DirectoryReference::new(payload.path)))
        } else {
            Ok(Resolved::Stale(payload.path))
        }
    }
}

/// A resolved, authorized directory. Enumeration and moves require an
/// active access scope, acquired through [`DirectoryReference::acquire`].
pub struct DirectoryReference {
    path: PathBuf,
    active: AtomicBool,
}

impl DirectoryReference {
    pub fn new(path: PathBuf) -> Self {
        Self { path, active: AtomicBool::new(false) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Activate the access scope. The returned guard deactivates it on
    /// drop, on every exit path. Activation probes the directory for
    /// readability and fails with `AccessDenied` when the probe fails.
    pub fn acquire(&self) -> Result<AccessScope<'_>> {
        std::fs::read_dir(&self.path).map_err(|e| {
            TaxisError::AccessDenied(format!("{}: {}", self.path.display(), e))
        })?;
        self.active.store(true, Ordering::SeqCst);
        debug!("Access scope activated for {:?}", self.path);
        Ok(AccessScope { reference: self })
    }
}

/// RAII guard for an active access scope.
pub struct AccessScope<'a> {
    reference: &'a DirectoryReference,
}

impl Drop for AccessScope<'_> {
    fn drop(&mut self) {
        self.reference.active.store(false, Ordering::SeqCst);
        debug!("Access scope released for {:?}", self.reference.path);
    }
}

/// Snapshot of the persisted grant, for status reporting. Inspects the
/// store without triggering the picker.
#[derive(Debug, PartialEq, Eq)]
pub enum GrantStatus {
    Absent,
    Valid(PathBuf),
    Stale(PathBuf),
}

/// The access grant store: loads, persists, resets and transparently
/// reacquires the single directory grant.
pub struct GrantStore {
    store: Box<dyn KvStore>,
    picker: Box<dyn DirectoryPicker>,
}

impl GrantStore {
    pub fn new(store: Box<dyn KvStore>, picker: Box<dyn DirectoryPicker>) -> Self {
        Self { store, picker }
    }

    /// Load the persisted grant. Returns `Ok(None)` when no grant is
    /// persisted (a new one must be requested). A grant that resolves
    /// stale is reacquired here via the picker; the returned reference
    /// is always valid.
    pub fn load_grant(&self) -> Result<Option<DirectoryReference>> {
        let token = match self.store.get(GRANT_KEY)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let grant = AccessGrant::from_token(token);
        match grant.resolve() {
            Ok(Resolved::Valid(reference)) => {
                debug!("Loaded grant for {:?}", reference.path());
                Ok(Some(reference))
            }
            Ok(Resolved::Stale(path)) => {
                warn!("Grant for {:?} is stale, requesting a new one", path);
                self.request_new_grant().map(Some)
            }
            Err(e) => {
                // Undecodable token: same as no grant.
                warn!("{}", e);
                Ok(None)
            }
        }
    }

    /// Ask the picker for a directory, persist a grant for it
    /// (replacing any existing grant) and return the reference.
    pub fn request_new_grant(&self) -> Result<DirectoryReference> {
        let path = match self.picker.pick()? {
            Some(path) => path,
            None => return Err(TaxisError::UserCancelled),
        };

        let grant = AccessGrant::for_directory(&path)?;
        self.store.set(GRANT_KEY, grant.token())?;
        info!("Grant saved for {:?}", path);

        Ok(DirectoryReference::new(path))
    }

    /// The reference for an organize run: the persisted grant when one
    /// is valid, a fresh one from the picker otherwise.
    pub fn obtain(&self) -> Result<DirectoryReference> {
        match self.load_grant()? {
            Some(reference) => Ok(reference),
            None => self.request_new_grant(),
        }
    }

    /// Delete the persisted grant. Idempotent; in-memory references
    /// held by a running process are unaffected.
    pub fn reset_grant(&self) -> Result<()> {
        self.store.remove(GRANT_KEY)?;
        info!("Grant reset");
        Ok(())
    }

    /// Inspect the persisted grant without side effects.
    pub fn status(&self) -> Result<GrantStatus> {
        let token = match self.store.get(GRANT_KEY)? {
            Some(bytes) => bytes,
            None => return Ok(GrantStatus::Absent),
        };
        match AccessGrant::from_token(token).resolve() {
            Ok(Resolved::Valid(reference)) => Ok(GrantStatus::Valid(reference.path().to_path_buf())),
            Ok(Resolved::Stale(path)) => Ok(GrantStatus::Stale(path)),
            Err(_) => Ok(GrantStatus::Absent),
        }
    }
}
