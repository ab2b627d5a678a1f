//! Input file abstraction.
//!
//! The picker collaborator hands the core an ordered list of sources:
//! the in-torrent path, a declared length, and a way to open the byte
//! stream. [`DiskFile`] covers the normal case; [`MemoryFile`] serves
//! in-memory data and tests.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncRead;

/// An ordered input file for the hashing pipeline.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Path segments relative to the torrent root; never empty.
    fn path(&self) -> &[String];

    /// Declared length in bytes. The opened stream must yield exactly
    /// this many; a shorter stream is reported as a read error.
    fn length(&self) -> u64;

    /// Opens the byte stream from the start.
    async fn open(&self) -> io::Result<Box<dyn AsyncRead + Send + Unpin>>;

    /// Slash-joined path for messages and progress callbacks.
    fn display_path(&self) -> String {
        self.path().join("/")
    }
}

/// A file on disk, read through tokio.
pub struct DiskFile {
    path: Vec<String>,
    disk_path: PathBuf,
    length: u64,
}

impl DiskFile {
    /// Describes a file on disk. `path` is the file's path inside the
    /// torrent; the length is taken from the filesystem now and becomes
    /// the declared length.
    pub async fn new(disk_path: impl Into<PathBuf>, path: Vec<String>) -> io::Result<Self> {
        let disk_path = disk_path.into();
        let length = tokio::fs::metadata(&disk_path).await?.len();
        Ok(Self {
            path,
            disk_path,
            length,
        })
    }
}

#[async_trait]
impl FileSource for DiskFile {
    fn path(&self) -> &[String] {
        &self.path
    }

    fn length(&self) -> u64 {
        self.length
    }

    async fn open(&self) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(File::open(&self.disk_path).await?))
    }
}

/// An in-memory byte source.
pub struct MemoryFile {
    path: Vec<String>,
    data: Bytes,
}

impl MemoryFile {
    pub fn new(path: Vec<String>, data: impl Into<Bytes>) -> Self {
        Self {
            path,
            data: data.into(),
        }
    }
}

#[async_trait]
impl FileSource for MemoryFile {
    fn path(&self) -> &[String] {
        &self.path
    }

    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open(&self) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(std::io::Cursor::new(self.data.clone())))
    }
}
