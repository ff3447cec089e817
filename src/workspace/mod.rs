//! Read-only filesystem access for directory reviews and MCP resources.
//!
//! Everything here is synchronous; async callers go through
//! `tokio::task::spawn_blocking`.

mod walker;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use walker::{DirectorySnapshot, DirectoryWalker, WalkLimits};

pub const WORKSPACE_URI: &str = "workspace://current";
pub const FILE_SCHEME: &str = "file://";
pub const DIR_SCHEME: &str = "dir://";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Unsupported resource URI: {0}")]
    UnsupportedUri(String),

    #[error("Directory walk cancelled")]
    Cancelled,

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A resource URI understood by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    File(PathBuf),
    Directory(PathBuf),
    CurrentWorkspace,
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Result<Self, WorkspaceError> {
        if uri == WORKSPACE_URI {
            return Ok(Self::CurrentWorkspace);
        }
        if let Some(path) = uri.strip_prefix(FILE_SCHEME).filter(|p| !p.is_empty()) {
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some(path) = uri.strip_prefix(DIR_SCHEME).filter(|p| !p.is_empty()) {
            return Ok(Self::Directory(PathBuf::from(path)));
        }
        Err(WorkspaceError::UnsupportedUri(uri.to_string()))
    }
}

/// Render the text behind a resource URI.
pub fn read_resource(uri: &str, walker: &DirectoryWalker) -> Result<String, WorkspaceError> {
    match ResourceUri::parse(uri)? {
        ResourceUri::File(path) if path.is_dir() => Ok(walker.snapshot(&path)?.rendered),
        ResourceUri::File(path) => read_file(&path, walker.limits().max_file_bytes),
        ResourceUri::Directory(path) => Ok(walker.snapshot(&path)?.rendered),
        ResourceUri::CurrentWorkspace => {
            let cwd = std::env::current_dir().map_err(|source| WorkspaceError::Io {
                path: ".".to_string(),
                source,
            })?;
            let snapshot = walker.snapshot(&cwd)?;
            Ok(format!(
                "Current Workspace: {}\n\n{}",
                cwd.display(),
                snapshot.rendered
            ))
        }
    }
}

/// `File: {path}` followed by at most `max_bytes` of the file's text.
pub fn read_file(path: &Path, max_bytes: usize) -> Result<String, WorkspaceError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(WorkspaceError::NotFound(display));
    }
    let (content, cut) = walker::read_prefix(path, max_bytes).ok_or_else(|| WorkspaceError::Io {
        path: display.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not a readable text file"),
    })?;
    let marker = if cut { "\n... (file truncated)" } else { "" };
    Ok(format!("File: {}\n\n{}{}", display, content, marker))
}

/// Turn a client root URI (`file:///home/me/project`) into a local path.
pub fn root_uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix(FILE_SCHEME)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
