//! Filesystem collaborator used by the pipeline stages.
//!
//! The stages never touch `std::fs` directly; they go through [`FileSystem`]
//! so a search can run against the local disk or against an in-memory tree.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};

const BUFFER_CAPACITY: usize = 65536;

/// Lazily produced lines of a single file
pub type Lines = Box<dyn Iterator<Item = SearchResult<String>>>;

/// Size and creation time of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub created: Option<SystemTime>,
}

/// The primitives the pipeline needs from a filesystem.
///
/// Listings return immediate children only, in whatever order the
/// implementation produces them.
pub trait FileSystem: Send + Sync {
    fn list_subdirectories(&self, path: &Path) -> SearchResult<Vec<PathBuf>>;

    fn list_files(&self, path: &Path) -> SearchResult<Vec<PathBuf>>;

    /// Opens `path` and returns its lines without the line terminators
    fn read_lines(&self, path: &Path) -> SearchResult<Lines>;

    fn metadata(&self, path: &Path) -> SearchResult<FileMetadata>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem {
    encoding_mode: EncodingMode,
}

impl LocalFileSystem {
    pub fn new(encoding_mode: EncodingMode) -> Self {
        Self { encoding_mode }
    }

    fn list(&self, path: &Path, wanted: EntryKind) -> SearchResult<Vec<PathBuf>> {
        let entries = fs::read_dir(path).map_err(|e| SearchError::from_io(path, e))?;

        let mut children = Vec::new();
        for entry in readable_entries(path, entries) {
            let entry_path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    trace!("Skipping unreadable entry {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            let kind = if file_type.is_dir() {
                Some(EntryKind::Directory)
            } else if file_type.is_file() {
                Some(EntryKind::File)
            } else if file_type.is_symlink() {
                // Symlinked files are searched, symlinked directories are not walked
                fs::metadata(&entry_path)
                    .ok()
                    .filter(|m| m.is_file())
                    .map(|_| EntryKind::File)
            } else {
                None
            };

            if kind == Some(wanted) {
                children.push(entry_path);
            }
        }
        Ok(children)
    }
}

impl FileSystem for LocalFileSystem {
    fn list_subdirectories(&self, path: &Path) -> SearchResult<Vec<PathBuf>> {
        self.list(path, EntryKind::Directory)
    }

    fn list_files(&self, path: &Path) -> SearchResult<Vec<PathBuf>> {
        self.list(path, EntryKind::File)
    }

    fn read_lines(&self, path: &Path) -> SearchResult<Lines> {
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        Ok(Box::new(LineReader::new(
            path.to_path_buf(),
            BufReader::with_capacity(BUFFER_CAPACITY, file),
            self.encoding_mode,
        )))
    }

    fn metadata(&self, path: &Path) -> SearchResult<FileMetadata> {
        let metadata = fs::metadata(path).map_err(|e| SearchError::from_io(path, e))?;
        // Not every filesystem records a birth time
        let created = metadata.created().or_else(|_| metadata.modified()).ok();
        Ok(FileMetadata {
            size: metadata.len(),
            created,
        })
    }
}

/// Drops entries that fail to read, keeping the rest of the listing
fn readable_entries<'a, T>(
    dir: &'a Path,
    entries: impl Iterator<Item = io::Result<T>> + 'a,
) -> impl Iterator<Item = T> + 'a {
    entries.filter_map(move |entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            trace!("Skipping unreadable entry in {}: {}", dir.display(), e);
            None
        }
    })
}

/// Splits a reader into `\n`-terminated lines and decodes them.
///
/// The iterator is fused after the first error.
pub struct LineReader<R> {
    path: PathBuf,
    reader: R,
    encoding_mode: EncodingMode,
    buffer: Vec<u8>,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(path: PathBuf, reader: R, encoding_mode: EncodingMode) -> Self {
        Self {
            path,
            reader,
            encoding_mode,
            buffer: Vec::with_capacity(256),
            line_number: 0,
            done: false,
        }
    }

    fn decode(&self, bytes: Vec<u8>) -> SearchResult<String> {
        match self.encoding_mode {
            EncodingMode::FailFast => String::from_utf8(bytes)
                .map_err(|e| SearchError::encoding_error(&self.path, self.line_number, e)),
            EncodingMode::Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = SearchResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                if self.buffer.last() == Some(&b'\n') {
                    self.buffer.pop();
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.pop();
                    }
                }
                let bytes = std::mem::take(&mut self.buffer);
                let line = self.decode(bytes);
                if line.is_err() {
                    self.done = true;
                }
                Some(line)
            }
            Err(e) => {
                self.done = true;
                Some(Err(SearchError::from_io(&self.path, e)))
            }
        }
    }
}
