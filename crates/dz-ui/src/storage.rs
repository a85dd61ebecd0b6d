//! Key-value preference storage.
//!
//! Mirrors the browser `localStorage` API: string keys, string values, and
//! every access can fail (storage disabled, quota exceeded, private mode).

/// Semantic storage error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Storage is disabled or not provided by the host.
    Unavailable,
    /// The write exceeded the storage quota.
    QuotaExceeded,
    /// Other/unknown error category.
    Other,
}

/// Storage access error.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Host-provided detail.
    pub message: String,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an "unavailable" error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Unavailable, message)
    }
}

impl std::fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unavailable => "Storage unavailable",
            Self::QuotaExceeded => "Storage quota exceeded",
            Self::Other => "Storage error",
        };
        f.write_str(label)
    }
}

/// String key-value storage.
pub trait KeyValueStorage {
    /// Read a value. `Ok(None)` means the key is not set.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}
