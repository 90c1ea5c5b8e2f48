//! Dropbox store implementation
//!
//! Implements the `RemoteStore` trait over the Dropbox v2 HTTP API using
//! plain `reqwest` requests with bearer authentication. RPC endpoints take
//! and return JSON; content endpoints carry the JSON argument in the
//! `Dropbox-API-Arg` header and the raw payload in the body.
//!
//! No retries, timeouts or caching are added here: a non-success response
//! (including 429s) fails the calling operation immediately, and any timeout
//! behavior is whatever the HTTP client inherits from the platform.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use dv_core::{
    Entry, Error, Profile, RemotePath, RemoteStore, Result, SearchMatch, StoreCapabilities,
    WriteMode,
};

use crate::session::{SESSION_CHUNK_SIZE, SINGLE_REQUEST_LIMIT, chunk_count, chunk_range};

const DEFAULT_API_BASE: &str = "https://api.dropboxapi.com";
const DEFAULT_CONTENT_BASE: &str = "https://content.dropboxapi.com";

/// Dropbox client wrapper
pub struct DropboxStore {
    http: reqwest::Client,
    token: String,
    api_base: String,
    content_base: String,
}

impl DropboxStore {
    /// Create a store for an account token, using the public API endpoints
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_endpoints(token, DEFAULT_API_BASE, DEFAULT_CONTENT_BASE)
    }

    /// Create a store from a stored profile, honoring endpoint overrides
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        Self::with_endpoints(
            profile.token.clone(),
            profile.api_endpoint.as_deref().unwrap_or(DEFAULT_API_BASE),
            profile
                .content_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_CONTENT_BASE),
        )
    }

    /// Create a store against custom endpoints (stub servers, proxies)
    pub fn with_endpoints(
        token: impl Into<String>,
        api_base: &str,
        content_base: &str,
    ) -> Result<Self> {
        for base in [api_base, content_base] {
            url::Url::parse(base)
                .map_err(|e| Error::Config(format!("invalid endpoint '{base}': {e}")))?;
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            content_base: content_base.trim_end_matches('/').to_string(),
        })
    }

    /// The API addresses the root as the empty string, not "/"
    fn api_path(path: &RemotePath) -> &str {
        if path.is_root() { "" } else { path.as_str() }
    }

    fn rpc_url(&self, endpoint: &str) -> String {
        format!("{}/2/{endpoint}", self.api_base)
    }

    fn content_url(&self, endpoint: &str) -> String {
        format!("{}/2/{endpoint}", self.content_base)
    }

    /// Map a non-success HTTP response to the crate error taxonomy
    fn map_status(path: &RemotePath, status: StatusCode, body: &str) -> Error {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(body.to_string()),
            // The API reports path lookup failures as 409 with a tagged body.
            StatusCode::CONFLICT if body.contains("not_found") => {
                Error::NotFound(path.to_string())
            }
            _ => Error::transport(path, format!("HTTP {}: {body}", status.as_u16())),
        }
    }

    /// Make an RPC request against the API endpoint
    async fn rpc<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &RemotePath,
        arg: &(impl Serialize + Sync),
    ) -> Result<T> {
        let url = self.rpc_url(endpoint);
        tracing::debug!(endpoint, path = %path, "dropbox rpc");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(arg)
            .send()
            .await
            .map_err(|e| Error::transport(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Self::map_status(path, status, &body));
        }

        response.json().await.map_err(|e| Error::transport(path, e))
    }

    /// Make a content request: JSON argument in the header, raw body
    async fn content_request(
        &self,
        endpoint: &str,
        path: &RemotePath,
        arg: &(impl Serialize + Sync),
        body: Vec<u8>,
    ) -> Result<reqwest::Response> {
        let url = self.content_url(endpoint);
        let arg = serde_json::to_string(arg).map_err(|e| Error::transport(path, e))?;
        tracing::debug!(endpoint, path = %path, "dropbox content request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::transport(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Self::map_status(path, status, &body));
        }

        Ok(response)
    }

    /// Push a payload through an upload session in fixed-size chunks
    async fn upload_session(
        &self,
        data: Vec<u8>,
        path: &RemotePath,
        mode: WriteMode,
    ) -> Result<()> {
        let total = data.len();
        let count = chunk_count(total, SESSION_CHUNK_SIZE);
        tracing::debug!(path = %path, chunks = count, "starting upload session");

        let start: SessionStartResponse = self
            .content_request(
                "files/upload_session/start",
                path,
                &SessionStartArg { close: false },
                Vec::new(),
            )
            .await?
            .json()
            .await
            .map_err(|e| Error::transport(path, e))?;

        let mut offset = 0u64;
        for index in 0..count {
            let (from, to) = chunk_range(index, SESSION_CHUNK_SIZE, total);
            self.content_request(
                "files/upload_session/append_v2",
                path,
                &SessionAppendArg {
                    cursor: SessionCursor {
                        session_id: &start.session_id,
                        offset,
                    },
                    close: false,
                },
                data[from..to].to_vec(),
            )
            .await?;
            offset = to as u64;
        }

        self.content_request(
            "files/upload_session/finish",
            path,
            &SessionFinishArg {
                cursor: SessionCursor {
                    session_id: &start.session_id,
                    offset,
                },
                commit: CommitArg::new(path, mode),
            },
            Vec::new(),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RemoteStore for DropboxStore {
    async fn search(&self, folder: &RemotePath, name: &str) -> Result<Vec<SearchMatch>> {
        let response: SearchResponse = self
            .rpc(
                "files/search_v2",
                folder,
                &SearchArg {
                    query: name,
                    options: SearchOptions {
                        path: Self::api_path(folder),
                        filename_only: true,
                    },
                },
            )
            .await?;

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                let meta = m.metadata.metadata;
                meta.path_lower.map(|path| SearchMatch {
                    path,
                    name: meta.name,
                })
            })
            .collect())
    }

    async fn list_folder(&self, folder: &RemotePath) -> Result<Vec<Entry>> {
        let mut page: ListFolderResponse = self
            .rpc(
                "files/list_folder",
                folder,
                &ListFolderArg {
                    path: Self::api_path(folder),
                    recursive: false,
                },
            )
            .await?;

        let mut entries: Vec<Entry> = page.entries.drain(..).map(Entry::from).collect();
        while page.has_more {
            let next: ListFolderResponse = self
                .rpc(
                    "files/list_folder/continue",
                    folder,
                    &CursorArg {
                        cursor: &page.cursor,
                    },
                )
                .await?;
            page = next;
            entries.extend(page.entries.drain(..).map(Entry::from));
        }

        Ok(entries)
    }

    async fn download(&self, path: &RemotePath) -> Result<Vec<u8>> {
        let response = self
            .content_request(
                "files/download",
                path,
                &PathArg {
                    path: Self::api_path(path),
                },
                Vec::new(),
            )
            .await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(path, e))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, data: Vec<u8>, path: &RemotePath, mode: WriteMode) -> Result<()> {
        if data.len() > SINGLE_REQUEST_LIMIT {
            return self.upload_session(data, path, mode).await;
        }

        self.content_request("files/upload", path, &CommitArg::new(path, mode), data)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &RemotePath) -> Result<()> {
        let _: serde_json::Value = self
            .rpc(
                "files/delete_v2",
                path,
                &PathArg {
                    path: Self::api_path(path),
                },
            )
            .await?;
        Ok(())
    }

    async fn copy(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let _: serde_json::Value = self
            .rpc(
                "files/copy_v2",
                src,
                &RelocationArg {
                    from_path: Self::api_path(src),
                    to_path: Self::api_path(dest),
                },
            )
            .await?;
        Ok(())
    }

    async fn rename(&self, src: &RemotePath, dest: &RemotePath) -> Result<()> {
        let _: serde_json::Value = self
            .rpc(
                "files/move_v2",
                src,
                &RelocationArg {
                    from_path: Self::api_path(src),
                    to_path: Self::api_path(dest),
                },
            )
            .await?;
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            atomic_move: true,
            server_copy: true,
        }
    }
}

// ==================== Wire types ====================

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct RelocationArg<'a> {
    from_path: &'a str,
    to_path: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchArg<'a> {
    query: &'a str,
    options: SearchOptions<'a>,
}

#[derive(Debug, Serialize)]
struct SearchOptions<'a> {
    path: &'a str,
    filename_only: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchResultMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchResultMatch {
    metadata: TaggedMetadata,
}

#[derive(Debug, Deserialize)]
struct TaggedMetadata {
    metadata: MetadataWire,
}

/// File or folder metadata as the API renders it
#[derive(Debug, Deserialize)]
struct MetadataWire {
    #[serde(rename = ".tag", default)]
    tag: String,

    name: String,

    #[serde(default)]
    path_lower: Option<String>,

    #[serde(default)]
    size: Option<u64>,

    #[serde(default)]
    server_modified: Option<String>,
}

impl From<MetadataWire> for Entry {
    fn from(wire: MetadataWire) -> Self {
        let is_folder = wire.tag == "folder";
        Entry {
            name: wire.name,
            size: if is_folder { None } else { wire.size },
            modified: wire
                .server_modified
                .and_then(|s| s.parse::<jiff::Timestamp>().ok()),
            is_folder,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    #[serde(default)]
    entries: Vec<MetadataWire>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Serialize)]
struct CursorArg<'a> {
    cursor: &'a str,
}

/// Upload commit: target path and conflict policy
#[derive(Debug, Serialize)]
struct CommitArg<'a> {
    path: &'a str,
    mode: String,
    autorename: bool,
    mute: bool,
}

impl<'a> CommitArg<'a> {
    fn new(path: &'a RemotePath, mode: WriteMode) -> Self {
        Self {
            path: DropboxStore::api_path(path),
            mode: mode.to_string(),
            autorename: false,
            mute: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionStartArg {
    close: bool,
}

#[derive(Debug, Deserialize)]
struct SessionStartResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct SessionCursor<'a> {
    session_id: &'a str,
    offset: u64,
}

#[derive(Debug, Serialize)]
struct SessionAppendArg<'a> {
    cursor: SessionCursor<'a>,
    close: bool,
}

#[derive(Debug, Serialize)]
struct SessionFinishArg<'a> {
    cursor: SessionCursor<'a>,
    commit: CommitArg<'a>,
}
