//! The typed client
//!
//! `Vault` composes the transfer pipeline (raw bytes in and out of the store)
//! with per-format codecs and the lifecycle operations. It is generic over
//! the [`RemoteStore`] backend and holds nothing but the store handle:
//! every call is one stateless request/response, with no caching and no
//! retries.

use arrow::record_batch::RecordBatch;
use humansize::{BINARY, format_size};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Mapping;

use crate::codec::{self, Format};
use crate::codec::csv::CsvOptions;
use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{Entry, RemoteStore, WriteMode};

/// What a plain-file write carries.
///
/// Text is UTF-8 encoded exactly once, at the pipeline boundary; below that
/// the pipeline is binary-only and has a single code path for both kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Binary(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Binary(bytes) => bytes,
            Payload::Text(text) => text.into_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Binary(bytes) => bytes.len(),
            Payload::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Binary(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// Typed convenience client over a remote store.
///
/// Paths accepted by every method are caller-style strings; they are
/// normalized before anything touches the network, so `notes.yml`,
/// `/notes.yml` and `\notes.yml` all address the same remote object.
pub struct Vault<S> {
    store: S,
}

impl<S: RemoteStore> Vault<S> {
    /// Wrap a connected store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store handle
    pub fn store(&self) -> &S {
        &self.store
    }

    // ==================== Existence ====================

    /// Whether `path` denotes an existing remote object.
    ///
    /// Resolution searches the parent folder for the leaf name and accepts a
    /// hit only when its full path equals the target after case folding, so a
    /// same-named file in a sibling folder never counts. Absence is a normal
    /// `Ok(false)`, not an error.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let path = RemotePath::new(path)?;
        if path.is_root() {
            return Ok(true);
        }

        let parent = path.parent();
        let target = path.as_str().to_lowercase();
        let matches = self.store.search(&parent, path.name()).await?;
        Ok(matches.iter().any(|m| m.path.to_lowercase() == target))
    }

    // ==================== Lifecycle ====================

    /// Entry names of a folder, sorted ascending in byte order.
    ///
    /// The sort is applied here so results are stable regardless of the
    /// remote listing's native order.
    pub async fn ls(&self, folder: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .entries(folder)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Full folder listing, sorted by name
    pub async fn entries(&self, folder: &str) -> Result<Vec<Entry>> {
        let folder = RemotePath::new(folder)?;
        let mut entries = self.store.list_folder(&folder).await?;
        entries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Delete a file or folder.
    ///
    /// A missing target is whatever the store reports it as, typically
    /// [`Error::NotFound`]; it is not masked here.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = RemotePath::new(path)?;
        tracing::info!(path = %path, "deleting from remote store");
        self.store.delete(&path).await
    }

    /// Move a file.
    ///
    /// With `overwrite`, an existing destination is deleted first. The move
    /// itself uses the store's atomic primitive when it has one and falls
    /// back to server-side copy plus delete-source otherwise.
    pub async fn mv(&self, src: &str, dest: &str, overwrite: bool) -> Result<()> {
        let src = RemotePath::new(src)?;
        let dest = RemotePath::new(dest)?;
        tracing::debug!(src = %src, dest = %dest, "moving remote file");

        if overwrite && self.exists(dest.as_str()).await? {
            self.store.delete(&dest).await?;
        }

        let caps = self.store.capabilities();
        if caps.atomic_move {
            self.store.rename(&src, &dest).await
        } else if caps.server_copy {
            self.store.copy(&src, &dest).await?;
            self.store.delete(&src).await
        } else {
            Err(Error::Unsupported(format!(
                "store offers neither move nor copy for '{src}'"
            )))
        }
    }

    // ==================== Transfer pipeline ====================

    async fn download_raw(&self, path: &RemotePath) -> Result<Vec<u8>> {
        tracing::info!(path = %path, "downloading from remote store");
        self.store.download(path).await
    }

    async fn upload_raw(&self, data: Vec<u8>, path: &RemotePath, mode: WriteMode) -> Result<()> {
        tracing::info!(
            path = %path,
            size = %format_size(data.len() as u64, BINARY),
            "uploading to remote store"
        );
        self.store.upload(data, path, mode).await
    }

    // ==================== Plain files ====================

    /// Raw content of a remote file
    pub async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let path = RemotePath::new(path)?;
        self.download_raw(&path).await
    }

    /// Content of a remote text file; invalid UTF-8 is a decode failure
    pub async fn read_text(&self, path: &str) -> Result<String> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        String::from_utf8(bytes).map_err(|e| Error::decode(Format::Text, &path, e))
    }

    /// Store a plain file, replacing any previous content
    pub async fn write_file(&self, payload: impl Into<Payload>, path: &str) -> Result<()> {
        self.write_file_with_mode(payload, path, WriteMode::Overwrite)
            .await
    }

    /// Store a plain file under an explicit conflict policy
    pub async fn write_file_with_mode(
        &self,
        payload: impl Into<Payload>,
        path: &str,
        mode: WriteMode,
    ) -> Result<()> {
        let path = RemotePath::new(path)?;
        self.upload_raw(payload.into().into_bytes(), &path, mode)
            .await
    }

    // ==================== YAML ====================

    /// Read a YAML document as an insertion-ordered mapping
    pub async fn read_yaml(&self, path: &str) -> Result<Mapping> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::yaml::decode(&bytes).map_err(|e| Error::decode(Format::Yaml, &path, e))
    }

    /// Write any serializable value as a block-style YAML document
    pub async fn write_yaml<T: Serialize>(&self, data: &T, path: &str) -> Result<()> {
        let path = RemotePath::new(path)?;
        let text = codec::yaml::encode(data).map_err(|e| Error::encode(Format::Yaml, &path, e))?;
        self.upload_raw(text.into_bytes(), &path, WriteMode::Overwrite)
            .await
    }

    // ==================== CSV ====================

    /// Read a CSV file as a record batch
    pub async fn read_csv(&self, path: &str, options: &CsvOptions) -> Result<RecordBatch> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::csv::decode(&bytes, options).map_err(|e| Error::decode(Format::Csv, &path, e))
    }

    /// Write a record batch as CSV text
    pub async fn write_csv(
        &self,
        frame: &RecordBatch,
        path: &str,
        options: &CsvOptions,
    ) -> Result<()> {
        let path = RemotePath::new(path)?;
        let text =
            codec::csv::encode(frame, options).map_err(|e| Error::encode(Format::Csv, &path, e))?;
        self.upload_raw(text, &path, WriteMode::Overwrite).await
    }

    // ==================== Parquet ====================

    /// Read a Parquet file as a record batch
    pub async fn read_parquet(&self, path: &str) -> Result<RecordBatch> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::parquet::decode(bytes).map_err(|e| Error::decode(Format::Parquet, &path, e))
    }

    /// Write a record batch as a Parquet file
    pub async fn write_parquet(&self, frame: &RecordBatch, path: &str) -> Result<()> {
        let path = RemotePath::new(path)?;
        let bytes =
            codec::parquet::encode(frame).map_err(|e| Error::encode(Format::Parquet, &path, e))?;
        self.upload_raw(bytes, &path, WriteMode::Overwrite).await
    }

    // ==================== Excel ====================

    /// Read the first sheet of a workbook as a record batch
    pub async fn read_excel(&self, path: &str) -> Result<RecordBatch> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::excel::decode(bytes, None).map_err(|e| Error::decode(Format::Excel, &path, e))
    }

    /// Read named sheets of a workbook, keyed in request order
    pub async fn read_excel_sheets(
        &self,
        path: &str,
        sheets: &[&str],
    ) -> Result<IndexMap<String, RecordBatch>> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::excel::decode_sheets(bytes, sheets)
            .map_err(|e| Error::decode(Format::Excel, &path, e))
    }

    /// Write a record batch as a workbook with exactly one sheet
    pub async fn write_excel(
        &self,
        frame: &RecordBatch,
        path: &str,
        sheet: Option<&str>,
    ) -> Result<()> {
        let path = RemotePath::new(path)?;
        let bytes = codec::excel::encode(frame, sheet)
            .map_err(|e| Error::encode(Format::Excel, &path, e))?;
        self.upload_raw(bytes, &path, WriteMode::Overwrite).await
    }

    // ==================== ZIP ====================

    /// Extract one member of a remote ZIP archive.
    ///
    /// With no member name the archive's first entry (in its own listing
    /// order) is returned. A missing member is [`Error::NotFound`]; a broken
    /// archive is a decode failure.
    pub async fn read_zip(&self, path: &str, member: Option<&str>) -> Result<Vec<u8>> {
        let path = RemotePath::new(path)?;
        let bytes = self.download_raw(&path).await?;
        codec::archive::extract(bytes, member).map_err(|e| {
            if e.is_member_missing() {
                let member = member.unwrap_or("<first entry>");
                Error::NotFound(format!("member '{member}' in archive '{path}'"))
            } else {
                Error::decode(Format::Zip, &path, e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_text() {
        let payload: Payload = "héllo".into();
        assert_eq!(payload.len(), 6);
        assert_eq!(payload.into_bytes(), "héllo".as_bytes());
    }

    #[test]
    fn test_payload_from_bytes() {
        let payload: Payload = vec![0u8, 159, 146, 150].into();
        assert!(matches!(payload, Payload::Binary(_)));
        assert_eq!(payload.into_bytes(), vec![0u8, 159, 146, 150]);
    }

    #[test]
    fn test_payload_empty() {
        assert!(Payload::from("").is_empty());
        assert!(!Payload::from("x").is_empty());
    }
}
