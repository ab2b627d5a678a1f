use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use rand::RngCore;
use sha1::Digest;
use tokio::io::AsyncRead;

use super::kernel::{compress_scalar, detect_compress, Sha1Kernel};
use super::*;
use crate::constants::{MACRO_CHUNK_SIZE, MAX_PIECE_LENGTH, PIECE_DIGEST_LEN};
use crate::metainfo::CreateError;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn ref_sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = sha1::Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

// ============================================================================
// Kernel
// ============================================================================

#[test]
fn test_kernel_fips_vectors() {
    assert_eq!(
        hex(&sha1(b"")),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
    assert_eq!(
        hex(&sha1(b"abc")),
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    );
    assert_eq!(
        hex(&sha1(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq")),
        "84983e441c3bd26ebaae4aa1f95129e5e54670f1"
    );
    assert_eq!(
        hex(&sha1(b"hello")),
        "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    );
}

#[test]
fn test_kernel_padding_boundaries() {
    // Lengths around the 56-byte and 64-byte padding cliffs.
    let mut rng = rand::thread_rng();
    for len in [0usize, 1, 54, 55, 56, 57, 63, 64, 65, 127, 128, 129, 1000] {
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        assert_eq!(sha1(&data), ref_sha1(&data), "length {len}");
    }
}

#[test]
fn test_kernel_matches_reference_on_large_input() {
    let mut data = vec![0u8; 1 << 20];
    rand::thread_rng().fill_bytes(&mut data);
    assert_eq!(sha1(&data), ref_sha1(&data));
}

#[test]
fn test_kernel_reuse_is_stateless() {
    let mut kernel = Sha1Kernel::new();
    let first = kernel.hash(b"hello");
    kernel.hash(b"something else entirely");
    assert_eq!(kernel.hash(b"hello"), first);
}

#[test]
fn test_compress_variants_are_bit_identical() {
    let detected = detect_compress();
    let mut rng = rand::thread_rng();
    for len in [0usize, 1, 63, 64, 65, 4096, 100_000] {
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        let scalar = Sha1Kernel::with_compress(compress_scalar).hash(&data);
        let selected = Sha1Kernel::with_compress(detected).hash(&data);
        assert_eq!(scalar, selected, "length {len}");
    }
}

// ============================================================================
// Pool
// ============================================================================

fn setup() -> (Arc<JobRegistry>, Arc<HashPool>, Arc<PieceBufferPool>) {
    let jobs = Arc::new(JobRegistry::new());
    let pool = HashPool::with_workers(4, jobs.clone());
    let buffers = PieceBufferPool::new(64);
    (jobs, pool, buffers)
}

#[tokio::test]
async fn test_pool_hashes_in_input_order() {
    let (jobs, pool, _) = setup();
    let job = jobs.begin();

    let pieces: [&[u8]; 3] = [b"one", b"two", b"three"];
    let inputs: Vec<BytesMut> = pieces.iter().map(|d| BytesMut::from(*d)).collect();
    let batch = pool
        .compute_hashes(inputs, Some(job))
        .await
        .expect("active job must hash");

    let mut expected = Vec::new();
    for data in pieces {
        expected.extend_from_slice(&ref_sha1(data));
    }
    assert_eq!(batch.digests.as_ref(), expected.as_slice());
    assert_eq!(batch.buffers.len(), 3, "input buffers come back");
}

#[tokio::test]
async fn test_pool_rejects_stale_job() {
    let (jobs, pool, _) = setup();
    let stale = jobs.begin();
    jobs.begin();

    let inputs = vec![BytesMut::from(&b"data"[..])];
    assert!(pool.compute_hashes(inputs, Some(stale)).await.is_none());
}

#[tokio::test]
async fn test_pool_without_job_id_always_runs() {
    let (jobs, pool, _) = setup();
    jobs.begin();
    let batch = pool
        .compute_hashes(vec![BytesMut::from(&b"x"[..])], None)
        .await
        .expect("no job id means no cancellation check");
    assert_eq!(batch.digests.as_ref(), &ref_sha1(b"x"));
}

#[tokio::test]
async fn test_pool_set_active_supersedes() {
    let (jobs, pool, _) = setup();
    let first = jobs.begin();
    assert!(jobs.is_active(first));
    let second = jobs.begin();
    assert!(!jobs.is_active(first));
    assert!(jobs.is_active(second));

    jobs.set_active(first);
    assert!(jobs.is_active(first));
    assert!(pool
        .compute_hashes(vec![BytesMut::new()], Some(first))
        .await
        .is_some());
}

#[test]
fn test_buffer_pool_recycles() {
    let buffers = PieceBufferPool::new(4);
    let mut buf = buffers.get(1024);
    buf.extend_from_slice(&[1, 2, 3]);
    buffers.put(buf);
    assert_eq!(buffers.available(), 1);

    let buf = buffers.get(16);
    assert!(buf.is_empty(), "recycled buffers come back cleared");
    assert!(buf.capacity() >= 16);
}

// ============================================================================
// Pipeline
// ============================================================================

fn mem(path: &[&str], data: &[u8]) -> Arc<dyn FileSource> {
    Arc::new(MemoryFile::new(
        path.iter().map(|s| s.to_string()).collect(),
        data.to_vec(),
    ))
}

async fn run_pipeline(
    files: &[Arc<dyn FileSource>],
    piece_length: u32,
) -> Result<bytes::Bytes, CreateError> {
    let (jobs, pool, buffers) = setup();
    let job = jobs.begin();
    let total: u64 = files.iter().map(|f| f.length()).sum();
    calculate_hashes(files, total, piece_length, job, &pool, &buffers, &NoProgress).await
}

#[tokio::test]
async fn test_pipeline_single_tiny_file() {
    let files = vec![mem(&["a.txt"], b"hello")];
    let table = run_pipeline(&files, 16384).await.unwrap();
    assert_eq!(table.as_ref(), &ref_sha1(b"hello"));
}

#[tokio::test]
async fn test_pipeline_two_files_two_pieces() {
    let files = vec![mem(&["a"], b"ab"), mem(&["b"], b"cd")];
    let table = run_pipeline(&files, 2).await.unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&ref_sha1(b"ab"));
    expected.extend_from_slice(&ref_sha1(b"cd"));
    assert_eq!(table.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_pipeline_piece_spans_files() {
    // "abc" + "de" with 4-byte pieces: pieces are "abcd" and "e".
    let files = vec![mem(&["x"], b"abc"), mem(&["y"], b"de")];
    let table = run_pipeline(&files, 4).await.unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&ref_sha1(b"abcd"));
    expected.extend_from_slice(&ref_sha1(b"e"));
    assert_eq!(table.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_pipeline_skips_empty_files() {
    let with_empty = vec![
        mem(&["a"], b"ab"),
        mem(&["empty"], b""),
        mem(&["b"], b"cd"),
    ];
    let without = vec![mem(&["a"], b"ab"), mem(&["b"], b"cd")];

    let table_a = run_pipeline(&with_empty, 2).await.unwrap();
    let table_b = run_pipeline(&without, 2).await.unwrap();
    assert_eq!(table_a, table_b);
}

#[tokio::test]
async fn test_pipeline_exact_piece_multiple_has_no_partial() {
    let data = vec![7u8; 8192];
    let files = vec![mem(&["f"], &data)];
    let table = run_pipeline(&files, 4096).await.unwrap();

    assert_eq!(table.len(), 2 * PIECE_DIGEST_LEN);
    let mut expected = Vec::new();
    expected.extend_from_slice(&ref_sha1(&data[..4096]));
    expected.extend_from_slice(&ref_sha1(&data[4096..]));
    assert_eq!(table.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_pipeline_single_byte_input() {
    let files = vec![mem(&["one"], b"z")];
    let table = run_pipeline(&files, 16384).await.unwrap();
    assert_eq!(table.as_ref(), &ref_sha1(b"z"));
}

#[tokio::test]
async fn test_pipeline_crosses_macro_chunk_boundary() {
    // 16 MiB + 1 byte with 16 MiB pieces: a full piece and a 1-byte tail,
    // dispatched as two separate macro-chunks.
    let mut data = vec![0u8; MACRO_CHUNK_SIZE + 1];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    let files = vec![mem(&["big"], &data)];
    let table = run_pipeline(&files, MAX_PIECE_LENGTH).await.unwrap();

    assert_eq!(table.len(), 2 * PIECE_DIGEST_LEN);
    let mut expected = Vec::new();
    expected.extend_from_slice(&ref_sha1(&data[..MACRO_CHUNK_SIZE]));
    expected.extend_from_slice(&ref_sha1(&data[MACRO_CHUNK_SIZE..]));
    assert_eq!(table.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_pipeline_cancelled_before_start() {
    let (jobs, pool, buffers) = setup();
    let job = jobs.begin();
    jobs.begin();

    let files = vec![mem(&["a"], b"hello")];
    let result = calculate_hashes(&files, 5, 16384, job, &pool, &buffers, &NoProgress).await;
    assert!(matches!(result, Err(CreateError::Cancelled)));
}

/// Declares more bytes than its stream yields.
struct TruncatedFile {
    path: Vec<String>,
    data: Vec<u8>,
}

#[async_trait]
impl FileSource for TruncatedFile {
    fn path(&self) -> &[String] {
        &self.path
    }

    fn length(&self) -> u64 {
        self.data.len() as u64 + 5
    }

    async fn open(&self) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        Ok(Box::new(io::Cursor::new(self.data.clone())))
    }
}

#[tokio::test]
async fn test_pipeline_truncated_file_is_io_error() {
    let files: Vec<Arc<dyn FileSource>> = vec![Arc::new(TruncatedFile {
        path: vec!["gone.bin".into()],
        data: b"abc".to_vec(),
    })];
    let err = run_pipeline(&files, 16384).await.unwrap_err();

    match &err {
        CreateError::Io { path } => assert_eq!(path, "gone.bin"),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Error reading file: gone.bin. The file might be inaccessible, or might have been modified, moved, or deleted."
    );
}

#[tokio::test]
async fn test_pipeline_progress_reaches_one() {
    let data = vec![3u8; 10_000];
    let files = vec![mem(&["f"], &data)];
    let progress = ProgressCounter::new(data.len() as u64);

    let (jobs, pool, buffers) = setup();
    let job = jobs.begin();
    calculate_hashes(
        &files,
        data.len() as u64,
        4096,
        job,
        &pool,
        &buffers,
        &progress,
    )
    .await
    .unwrap();

    assert_eq!(progress.bytes_read(), data.len() as u64);
    assert_eq!(progress.bytes_hashed(), data.len() as u64);
    assert_eq!(progress.fraction(), 1.0);
}

#[test]
fn test_progress_counter_empty_input_is_done() {
    assert_eq!(ProgressCounter::new(0).fraction(), 1.0);
}

#[tokio::test]
async fn test_disk_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let mut data = vec![0u8; 100_000];
    rand::thread_rng().fill_bytes(&mut data);
    tokio::fs::write(&path, &data).await.unwrap();

    let file = DiskFile::new(&path, vec!["data.bin".into()]).await.unwrap();
    assert_eq!(file.length(), data.len() as u64);

    let files: Vec<Arc<dyn FileSource>> = vec![Arc::new(file)];
    let table = run_pipeline(&files, 16384).await.unwrap();

    let mut expected = Vec::new();
    for chunk in data.chunks(16384) {
        expected.extend_from_slice(&ref_sha1(chunk));
    }
    assert_eq!(table.as_ref(), expected.as_slice());
}
