//! Remote path normalization
//!
//! Every operation addresses the store with an absolute, forward-slash path.
//! `RemotePath::new` canonicalizes whatever the caller passed in: backslashes
//! become forward slashes, repeated separators collapse, exactly one leading
//! separator is guaranteed, and the trailing separator is stripped (except for
//! the root itself). Relative segments (`.` and `..`) are rejected outright
//! rather than resolved, so a malformed path fails here instead of surfacing
//! as an ambiguous remote error.

use crate::error::{Error, Result};

/// A normalized absolute path in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// Normalize a caller-supplied path.
    ///
    /// Normalization is pure and idempotent: feeding the output back in
    /// yields the same path.
    pub fn new(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        if input.trim().is_empty() {
            return Err(Error::InvalidPath("path is empty".into()));
        }

        let mut segments = Vec::new();
        let normalized = input.replace('\\', "/");
        for segment in normalized.split('/') {
            match segment {
                // Repeated separators produce empty segments; collapse them.
                "" => continue,
                "." | ".." => {
                    return Err(Error::InvalidPath(format!(
                        "relative segment '{segment}' in '{input}'"
                    )));
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(format!("/{}", segments.join("/"))))
    }

    /// The store root
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leaf name; empty for the root
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Containing folder; the root's parent is the root itself
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(pos) => Self(self.0[..pos].to_string()),
        }
    }

    /// Append a child name, keeping the result normalized
    pub fn join(&self, child: &str) -> Result<Self> {
        if self.is_root() {
            Self::new(format!("/{child}"))
        } else {
            Self::new(format!("{}/{child}", self.0))
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RemotePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
