//! Torrent creation orchestration.
//!
//! [`TorrentCreator`] ties the subsystems together: validate the
//! parameters, resolve the piece length, run the hashing pipeline, and
//! assemble and encode the metainfo document.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::bencode::encode;
use crate::constants::{MACRO_CHUNK_SIZE, MIN_PIECE_LENGTH, PIECE_DIGEST_LEN};
use crate::hasher::{
    calculate_hashes, FileSource, HashPool, JobId, JobRegistry, PieceBufferPool, Progress,
};
use crate::metainfo::{
    build_info, build_outer, compute_info_hash, validate_options, CreateError, FileMeta, InfoHash,
    TorrentOptions,
};

/// A finished torrent document.
pub struct CreatedTorrent {
    /// The bencoded outer dictionary, ready to write as `<name>.torrent`.
    pub bytes: Bytes,
    /// SHA-1 of the bencoded `info` dictionary.
    pub info_hash: InfoHash,
    /// The torrent name the document carries.
    pub name: String,
    /// Resolved piece length in bytes.
    pub piece_length: u32,
    /// Number of pieces in the table.
    pub piece_count: usize,
    /// Total input size in bytes.
    pub total_size: u64,
}

/// Builds torrent files from input sources.
///
/// One creator can serve many runs; each [`TorrentCreator::create`]
/// call mints a fresh job id, so starting a new run (or calling
/// [`TorrentCreator::cancel`]) supersedes any run still in flight.
pub struct TorrentCreator {
    pool: Arc<HashPool>,
    buffers: Arc<PieceBufferPool>,
    jobs: Arc<JobRegistry>,
}

impl TorrentCreator {
    pub fn new() -> Self {
        let jobs = Arc::new(JobRegistry::new());
        let pool = HashPool::new(jobs.clone());
        // Deepest possible pipeline: every worker holding a full
        // macro-chunk of minimum-size pieces.
        let buffers =
            PieceBufferPool::new(pool.workers() * (MACRO_CHUNK_SIZE / MIN_PIECE_LENGTH as usize));
        Self {
            pool,
            buffers,
            jobs,
        }
    }

    pub fn pool(&self) -> &Arc<HashPool> {
        &self.pool
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    /// Supersedes any run in flight. The superseded run returns
    /// [`CreateError::Cancelled`] at its next cancellation check.
    pub fn cancel(&self) -> JobId {
        self.jobs.begin()
    }

    /// Builds a torrent from `files` with the given parameters.
    ///
    /// Files are hashed in the order given; their order is preserved in
    /// the `files` list of the metainfo. An empty file list yields
    /// [`CreateError::Cancelled`], matching the neutral outcome of a
    /// picker that produced nothing.
    pub async fn create(
        &self,
        files: &[Arc<dyn FileSource>],
        options: &TorrentOptions,
        progress: &dyn Progress,
    ) -> Result<CreatedTorrent, CreateError> {
        validate_options(options)?;
        if files.is_empty() {
            return Err(CreateError::Cancelled);
        }

        let job = self.jobs.begin();
        let total_size: u64 = files.iter().map(|f| f.length()).sum();
        let piece_length = options.piece_length.resolve(total_size);

        let piece_table = calculate_hashes(
            files,
            total_size,
            piece_length,
            job,
            &self.pool,
            &self.buffers,
            progress,
        )
        .await?;
        let piece_count = piece_table.len() / PIECE_DIGEST_LEN;

        let metas: Vec<FileMeta> = files
            .iter()
            .map(|file| FileMeta {
                path: file.path().to_vec(),
                length: file.length(),
            })
            .collect();

        let info = build_info(options, &metas, piece_length, piece_table);
        let info_hash = compute_info_hash(&info);
        let outer = build_outer(options, info);
        let bytes = Bytes::from(encode(&outer));

        debug!(
            name = %options.name,
            %info_hash,
            piece_length,
            piece_count,
            total_size,
            "torrent assembled"
        );

        Ok(CreatedTorrent {
            bytes,
            info_hash,
            name: options.name.clone(),
            piece_length,
            piece_count,
            total_size,
        })
    }
}

impl Default for TorrentCreator {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the default torrent name from the file listing: the file
/// name for a bare single file, otherwise the top-level folder name.
pub fn default_name(files: &[Arc<dyn FileSource>]) -> Option<String> {
    files.first()?.path().first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{MemoryFile, NoProgress, ProgressCounter};
    use crate::metainfo::PieceLength;
    use sha1::Digest;

    fn ref_sha1(data: &[u8]) -> [u8; 20] {
        let mut hasher = sha1::Sha1::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    fn mem(path: &[&str], data: &[u8]) -> Arc<dyn FileSource> {
        Arc::new(MemoryFile::new(
            path.iter().map(|s| s.to_string()).collect(),
            data.to_vec(),
        ))
    }

    fn plain_options(name: &str) -> TorrentOptions {
        TorrentOptions {
            name: name.into(),
            set_creation_date: false,
            ..TorrentOptions::default()
        }
    }

    #[tokio::test]
    async fn test_create_single_file_byte_exact() {
        let creator = TorrentCreator::new();
        let files = vec![mem(&["a.txt"], b"hello")];

        let torrent = creator
            .create(&files, &plain_options("a.txt"), &NoProgress)
            .await
            .unwrap();

        let mut info_bytes = Vec::new();
        info_bytes.extend_from_slice(b"d6:lengthi5e4:name5:a.txt12:piece lengthi16384e6:pieces20:");
        info_bytes.extend_from_slice(&ref_sha1(b"hello"));
        info_bytes.push(b'e');

        let mut expected = Vec::new();
        expected.extend_from_slice(b"d10:created by33:kimbatt.github.io/torrent-creator4:info");
        expected.extend_from_slice(&info_bytes);
        expected.push(b'e');

        assert_eq!(torrent.bytes.as_ref(), expected.as_slice());
        assert_eq!(torrent.info_hash.as_bytes(), &ref_sha1(&info_bytes));
        assert_eq!(torrent.piece_length, 16384);
        assert_eq!(torrent.piece_count, 1);
        assert_eq!(torrent.total_size, 5);
        assert_eq!(torrent.name, "a.txt");
    }

    #[tokio::test]
    async fn test_create_is_deterministic() {
        let creator = TorrentCreator::new();
        let files = vec![mem(&["dir", "x"], b"abcd"), mem(&["dir", "y"], b"efgh")];
        let options = plain_options("dir");

        let first = creator.create(&files, &options, &NoProgress).await.unwrap();
        let second = creator.create(&files, &options, &NoProgress).await.unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.info_hash, second.info_hash);
    }

    #[tokio::test]
    async fn test_create_file_order_changes_info_hash() {
        let creator = TorrentCreator::new();
        let forward = vec![mem(&["d", "x"], b"abcd"), mem(&["d", "y"], b"efgh")];
        let reversed = vec![mem(&["d", "y"], b"efgh"), mem(&["d", "x"], b"abcd")];
        let options = plain_options("d");

        let a = creator.create(&forward, &options, &NoProgress).await.unwrap();
        let b = creator.create(&reversed, &options, &NoProgress).await.unwrap();
        assert_ne!(a.info_hash, b.info_hash);
    }

    #[tokio::test]
    async fn test_create_empty_file_list_is_neutral() {
        let creator = TorrentCreator::new();
        let result = creator
            .create(&[], &plain_options("x"), &NoProgress)
            .await;
        assert!(matches!(result, Err(CreateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_options_before_hashing() {
        let creator = TorrentCreator::new();
        let files = vec![mem(&["a.txt"], b"hello")];
        let result = creator
            .create(&files, &plain_options(""), &NoProgress)
            .await;
        assert!(matches!(result, Err(CreateError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_multi_file_with_progress() {
        let creator = TorrentCreator::new();
        let files = vec![
            mem(&["album", "01.flac"], &[0x11; 40_000]),
            mem(&["album", "02.flac"], &[0x22; 25_000]),
        ];
        let mut options = plain_options("album");
        options.piece_length = PieceLength::Explicit(16384);
        options.trackers = "http://t.example/announce".into();

        let progress = ProgressCounter::new(65_000);
        let torrent = creator.create(&files, &options, &progress).await.unwrap();

        assert_eq!(torrent.piece_count, 4); // ceil(65000 / 16384)
        assert_eq!(progress.fraction(), 1.0);

        let announce = b"8:announce25:http://t.example/announce";
        assert!(torrent
            .bytes
            .windows(announce.len())
            .any(|w| w == announce));
    }

    #[test]
    fn test_default_name() {
        let single = vec![mem(&["track.mp3"], b"x")];
        assert_eq!(default_name(&single), Some("track.mp3".into()));

        let folder = vec![
            mem(&["album", "a.mp3"], b"x"),
            mem(&["album", "b.mp3"], b"y"),
        ];
        assert_eq!(default_name(&folder), Some("album".into()));

        assert_eq!(default_name(&[]), None);
    }
}
