use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;
use crate::schema::{ChatSession, SessionDocument, SCHEMA_VERSION};

/// File-backed store for the session record.
///
/// One JSON document per installation. Writes go through a sibling
/// temporary file and an atomic rename so a crash mid-write never
/// leaves a truncated record behind.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session record; `Ok(None)` when none exists yet.
    pub fn load(&self) -> Result<Option<ChatSession>, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionStoreError::io(
                    "reading session record",
                    &self.path,
                    source,
                ))
            }
        };

        let document = serde_json::from_str::<SessionDocument>(&raw)
            .map_err(|source| SessionStoreError::json_parse(&self.path, source))?;
        if document.version != SCHEMA_VERSION {
            return Err(SessionStoreError::UnsupportedVersion {
                path: self.path.clone(),
                found: document.version,
            });
        }

        Ok(Some(document.session))
    }

    /// Replace the stored session record.
    pub fn save(&self, session: &ChatSession) -> Result<(), SessionStoreError> {
        let document = SessionDocument::v1(session.clone());
        let serialized = serde_json::to_string_pretty(&document)
            .map_err(|source| SessionStoreError::json_serialize(&self.path, source))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| {
                    SessionStoreError::io("creating session directory", parent, source)
                })?;
            }
        }

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, serialized).map_err(|source| {
            SessionStoreError::io("writing session record", &staging, source)
        })?;
        fs::rename(&staging, &self.path).map_err(|source| {
            SessionStoreError::io("replacing session record", &self.path, source)
        })?;

        Ok(())
    }
}
