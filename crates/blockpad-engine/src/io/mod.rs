use crate::editing::Document;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a document; the block index is rebuilt from the text.
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    Ok(Document::from_text(&read_file(path)?))
}

/// Save a document verbatim, delimiters included.
pub fn write_document(path: &Path, doc: &Document) -> Result<(), IoError> {
    write_file(path, doc.source())
}

/// Read a file and return its content
pub fn read_file(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}
