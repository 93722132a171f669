//! Scoped scratch files for image outputs.
//!
//! Every output passes through a uniquely named file in the temp directory
//! and is read back into memory. The file is removed when the
//! [`ScratchFile`] is finished or dropped, so no exit path leaks it.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

use crate::error::ConversionError;

/// Number of random characters in scratch file names.
const RANDOM_LEN: usize = 7;

/// Process-wide scratch directory.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create a handle; the directory itself is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<(), ConversionError> {
        std::fs::create_dir_all(&self.root).map_err(|source| ConversionError::Scratch {
            path: self.root.clone(),
            source,
        })
    }

    /// Create an empty scratch file named
    /// `<millis>-<random>-<stem>-<suffix>.<extension>`.
    pub fn create(
        &self,
        original_name: &str,
        suffix: &str,
        extension: &str,
    ) -> Result<ScratchFile, ConversionError> {
        self.ensure()?;

        let prefix = format!("{}-", chrono::Utc::now().timestamp_millis());
        let tail = format!(
            "-{}-{}.{}",
            sanitize_stem(original_name),
            suffix,
            extension.trim_start_matches('.')
        );

        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .rand_bytes(RANDOM_LEN)
            .suffix(&tail)
            .tempfile_in(&self.root)
            .map_err(|source| ConversionError::Scratch {
                path: self.root.clone(),
                source,
            })?;

        let filename = file
            .path()
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(ScratchFile { file, filename })
    }
}

/// A scratch file deleted on [`ScratchFile::finish`] or drop.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
    filename: String,
}

impl ScratchFile {
    /// Generated file name (no directory).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Full path of the file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Write the given bytes to the file.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), ConversionError> {
        let path = self.file.path().to_path_buf();
        let f = self.file.as_file_mut();
        f.write_all(data)
            .and_then(|_| f.flush())
            .map_err(|source| ConversionError::Scratch { path, source })
    }

    /// Read the file back into memory and delete it.
    pub fn finish(mut self) -> Result<Bytes, ConversionError> {
        let path = self.file.path().to_path_buf();
        let mut buf = Vec::new();
        {
            let f = self.file.as_file_mut();
            f.seek(SeekFrom::Start(0))
                .and_then(|_| f.read_to_end(&mut buf))
                .map_err(|source| ConversionError::Scratch {
                    path: path.clone(),
                    source,
                })?;
        }

        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }

        Ok(Bytes::from(buf))
    }
}

/// Sanitize a filename stem for safe filesystem usage.
pub fn sanitize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let sanitized: String = stem
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .take(100)
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}
