//! dv-core: typed convenience client for Dropbox-style cloud storage
//!
//! This crate provides the backend-independent half of dropvault:
//! - Path normalization into the store's absolute-path convention
//! - The [`RemoteStore`] trait the storage backend implements
//! - The [`Vault`] client: existence checks, list/move/delete, and typed
//!   read/write of text, YAML, CSV, Parquet, Excel and ZIP payloads
//! - Profile management for stored credentials
//!
//! It is designed to be independent of any specific storage backend; the
//! companion `dv-dropbox` crate implements [`RemoteStore`] against the
//! Dropbox HTTP API, and tests drive [`Vault`] with in-memory stores.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod path;
pub mod traits;

pub use client::{Payload, Vault};
pub use codec::Format;
pub use codec::csv::CsvOptions;
pub use config::{Config, ConfigManager, Profile};
pub use error::{Error, Result};
pub use path::RemotePath;
pub use traits::{Entry, RemoteStore, SearchMatch, StoreCapabilities, WriteMode};
