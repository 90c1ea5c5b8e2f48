//! dv-dropbox: Dropbox HTTP API adapter for dropvault
//!
//! This crate implements the `RemoteStore` trait from dv-core against the
//! Dropbox v2 HTTP API. It is the only crate that talks to the network:
//! RPC calls go to `api.dropboxapi.com`, raw content transfers to
//! `content.dropboxapi.com`, and payloads above the single-request upload
//! limit are pushed through chunked upload sessions.

pub mod client;
pub mod session;

pub use client::DropboxStore;
