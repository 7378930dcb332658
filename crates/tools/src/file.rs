//! File reader and writer tools.
//!
//! Paths are taken as given, relative to the working directory. Any path
//! containing a `..` component is refused.

use schemars::JsonSchema;
use serde::Deserialize;
use std::path::{Component, Path};
use thiserror::Error;

pub const READER_NAME: &str = "file_reader";
pub const READER_DESCRIPTION: &str = "Read a UTF-8 text file and return its contents.";

pub const WRITER_NAME: &str = "file_writer";
pub const WRITER_DESCRIPTION: &str =
    "Write text to a file. Creates the file and missing parent directories, overwrites existing content.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileReadArgs {
    /// Path of the file to read
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileWriteArgs {
    /// Path of the file to write
    pub file_path: String,
    /// Text to write
    pub content: String,
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file path is empty")]
    EmptyPath,
    #[error("path traversal is not allowed: {0}")]
    Traversal(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("error reading file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("error writing file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

pub async fn read_file(args: FileReadArgs) -> Result<String, FileError> {
    let path = checked_path(&args.file_path)?;
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FileError::NotFound(args.file_path.clone())
        } else {
            FileError::Read {
                path: args.file_path.clone(),
                source,
            }
        }
    })
}

pub async fn write_file(args: FileWriteArgs) -> Result<String, FileError> {
    let path = checked_path(&args.file_path)?;
    let write_err = |source| FileError::Write {
        path: args.file_path.clone(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, &args.content).await.map_err(write_err)?;

    tracing::debug!(path = %args.file_path, bytes = args.content.len(), "Wrote file");
    Ok(format!(
        "Successfully wrote {} bytes to {}",
        args.content.len(),
        args.file_path
    ))
}

fn checked_path(raw: &str) -> Result<&Path, FileError> {
    if raw.trim().is_empty() {
        return Err(FileError::EmptyPath);
    }
    let path = Path::new(raw);
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(FileError::Traversal(raw.to_string()));
    }
    Ok(path)
}
