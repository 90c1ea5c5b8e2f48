//! ZIP member extraction
//!
//! Read-only: one member of an archive comes out as raw bytes. With no member
//! name the first entry in the archive's own listing order is selected, which
//! follows the central directory and not any alphabetical ordering.

use std::io::{Cursor, Read};

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors from archive extraction
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("archive has no entries")]
    Empty,
}

impl ArchiveError {
    /// Whether this failure is a missing member rather than a broken archive
    pub fn is_member_missing(&self) -> bool {
        matches!(self, ArchiveError::Zip(ZipError::FileNotFound) | ArchiveError::Empty)
    }
}

/// Extract one member from a ZIP archive
pub fn extract(bytes: Vec<u8>, member: Option<&str>) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut file = match member {
        Some(name) => archive.by_name(name)?,
        None => {
            if archive.is_empty() {
                return Err(ArchiveError::Empty);
            }
            archive.by_index(0)?
        }
    };

    let mut content = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut content)?;
    Ok(content)
}

/// Member names in the archive's own listing order
pub fn members(bytes: Vec<u8>) -> Result<Vec<String>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index(index)?.name().to_string());
    }
    Ok(names)
}
