//! RemoteStore trait definition
//!
//! The narrow capability interface between the typed client and whatever
//! backend actually holds the files. The Dropbox HTTP adapter implements it
//! for production; tests implement it in memory or with a mock.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::RemotePath;

/// One hit from a name search scoped to a folder.
///
/// `path` is the store's own rendition of the full path, already case-folded
/// by the store's convention. Callers compare it against a normalized target
/// rather than trusting the name alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Full path of the matched object, in the store's case folding
    pub path: String,

    /// Leaf name of the matched object
    pub name: String,
}

/// One entry of a folder listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Leaf name of the entry
    pub name: String,

    /// Size in bytes (absent for folders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Server-side modification time, when the store reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<Timestamp>,

    /// Whether the entry is a folder
    pub is_folder: bool,
}

impl Entry {
    /// Entry for a file
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size: Some(size),
            modified: None,
            is_folder: false,
        }
    }

    /// Entry for a folder
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            modified: None,
            is_folder: true,
        }
    }
}

/// Conflict policy for uploads.
///
/// The store keeps a single object per path; `Overwrite` replaces it,
/// `Add` fails when the path is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Add,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Overwrite => write!(f, "overwrite"),
            WriteMode::Add => write!(f, "add"),
        }
    }
}

/// Which lifecycle primitives the backend offers.
///
/// A backend may expose an atomic move, a server-side copy, or both; the
/// client composes copy-then-delete when no atomic move exists.
#[derive(Debug, Clone, Copy)]
pub struct StoreCapabilities {
    /// The store moves objects in one call
    pub atomic_move: bool,

    /// The store copies objects server-side
    pub server_copy: bool,
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            atomic_move: false,
            server_copy: true,
        }
    }
}

/// Trait for the remote storage backend
///
/// Every method is one request/response against the store: no retries, no
/// caching, no background work. A non-success transport outcome surfaces as
/// an error, never as partial content.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Search a folder for entries matching a name
    async fn search(&self, folder: &RemotePath, name: &str) -> Result<Vec<SearchMatch>>;

    /// List the entries of a folder, in whatever order the store returns them
    async fn list_folder(&self, folder: &RemotePath) -> Result<Vec<Entry>>;

    /// Fetch the raw content of a file
    async fn download(&self, path: &RemotePath) -> Result<Vec<u8>>;

    /// Store raw content at a path under the given conflict policy
    async fn upload(&self, data: Vec<u8>, path: &RemotePath, mode: WriteMode) -> Result<()>;

    /// Delete a file or folder; absence is the store's error to report
    async fn delete(&self, path: &RemotePath) -> Result<()>;

    /// Server-side copy, when the backend offers one
    async fn copy(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let _ = dest;
        Err(Error::Unsupported(format!(
            "server-side copy of '{src}' is not offered by this store"
        )))
    }

    /// Atomic move, when the backend offers one
    async fn rename(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let _ = dest;
        Err(Error::Unsupported(format!(
            "atomic move of '{src}' is not offered by this store"
        )))
    }

    /// Which of the optional primitives the backend implements
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }
}
