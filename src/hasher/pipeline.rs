//! Streaming piece-hash pipeline.
//!
//! Files are read sequentially into a 16 MiB macro-accumulator that is
//! independent of the piece size. Whenever the accumulator fills (or
//! the input ends), its contents are sliced into pieces, copied into
//! pooled buffers, and handed to the worker pool under a reserved piece
//! index range. Completions drain through a channel so digests land at
//! their precomputed table offsets and buffers recycle promptly, no
//! matter how workers interleave.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::pool::{HashBatch, HashPool, JobId, PieceBufferPool};
use super::progress::Progress;
use super::source::FileSource;
use crate::constants::{MACRO_CHUNK_SIZE, PIECE_DIGEST_LEN};
use crate::metainfo::CreateError;

/// One finished batch, keyed by its reserved piece range.
struct Completion {
    start_piece: usize,
    segment_len: usize,
    batch: Option<HashBatch>,
}

/// Hashes the concatenation of `files` into a piece table.
///
/// The returned buffer holds `ceil(total_size / piece_length)` 20-byte
/// digests in input order. Zero-length files contribute nothing. The
/// run aborts with [`CreateError::Cancelled`] as soon as `job` stops
/// being the active id, and with [`CreateError::Io`] if any source
/// fails or ends before its declared length.
pub async fn calculate_hashes(
    files: &[Arc<dyn FileSource>],
    total_size: u64,
    piece_length: u32,
    job: JobId,
    pool: &Arc<HashPool>,
    buffers: &Arc<PieceBufferPool>,
    progress: &dyn Progress,
) -> Result<Bytes, CreateError> {
    let piece_count = total_size.div_ceil(piece_length as u64) as usize;
    let mut table = BytesMut::zeroed(piece_count * PIECE_DIGEST_LEN);
    let mut acc = vec![0u8; MACRO_CHUNK_SIZE];
    let mut filled = 0usize;
    let mut next_piece = 0usize;

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut dispatched = 0usize;
    let mut completed = 0usize;

    debug!(
        files = files.len(),
        total_size,
        piece_length,
        pieces = piece_count,
        workers = pool.workers(),
        "hashing input"
    );

    for file in files {
        if file.length() == 0 {
            continue;
        }
        progress.on_file_open(&file.display_path());

        let mut reader = file
            .open()
            .await
            .map_err(|_| read_error(&**file))?;
        let mut remaining = file.length();

        while remaining > 0 {
            if !pool.jobs().is_active(job) {
                return Err(CreateError::Cancelled);
            }

            let want = remaining.min((MACRO_CHUNK_SIZE - filled) as u64) as usize;
            let n = reader
                .read(&mut acc[filled..filled + want])
                .await
                .map_err(|_| read_error(&**file))?;
            if n == 0 {
                // Stream ended before the declared length.
                return Err(read_error(&**file));
            }
            filled += n;
            remaining -= n as u64;
            progress.on_bytes_read(n as u64);

            if filled == MACRO_CHUNK_SIZE {
                dispatch(
                    &acc[..filled],
                    piece_length,
                    &mut next_piece,
                    job,
                    pool,
                    buffers,
                    &done_tx,
                    &mut dispatched,
                )
                .await?;
                filled = 0;
            }

            // Harvest whatever already finished so buffers recycle and
            // digests land while we keep reading.
            while let Ok(done) = done_rx.try_recv() {
                integrate(done, &mut table, buffers, progress, &mut completed)?;
            }
        }
    }

    if filled > 0 {
        dispatch(
            &acc[..filled],
            piece_length,
            &mut next_piece,
            job,
            pool,
            buffers,
            &done_tx,
            &mut dispatched,
        )
        .await?;
    }

    while completed < dispatched {
        if !pool.jobs().is_active(job) {
            return Err(CreateError::Cancelled);
        }
        match done_rx.recv().await {
            Some(done) => integrate(done, &mut table, buffers, progress, &mut completed)?,
            // All senders gone with batches missing: treat as cancelled.
            None => return Err(CreateError::Cancelled),
        }
    }

    debug!(pieces = piece_count, "hashing complete");
    Ok(table.freeze())
}

/// Slices one accumulator segment into pieces and hands the batch to a
/// worker, reserving the piece index range up front.
#[allow(clippy::too_many_arguments)]
async fn dispatch(
    segment: &[u8],
    piece_length: u32,
    next_piece: &mut usize,
    job: JobId,
    pool: &Arc<HashPool>,
    buffers: &Arc<PieceBufferPool>,
    done_tx: &mpsc::UnboundedSender<Completion>,
    dispatched: &mut usize,
) -> Result<(), CreateError> {
    let lease = pool.acquire(Some(job)).await.ok_or(CreateError::Cancelled)?;

    let piece_length = piece_length as usize;
    let mut pieces = Vec::with_capacity(segment.len().div_ceil(piece_length));
    for chunk in segment.chunks(piece_length) {
        let mut buf = buffers.get(chunk.len());
        buf.extend_from_slice(chunk);
        pieces.push(buf);
    }

    let start_piece = *next_piece;
    *next_piece += pieces.len();
    let segment_len = segment.len();
    *dispatched += 1;
    trace!(start_piece, pieces = pieces.len(), segment_len, "dispatching batch");

    let tx = done_tx.clone();
    tokio::spawn(async move {
        let batch = lease.compute(pieces).await;
        let _ = tx.send(Completion {
            start_piece,
            segment_len,
            batch,
        });
    });
    Ok(())
}

/// Writes a finished batch into its reserved table slice and returns
/// the input buffers to the pool.
fn integrate(
    done: Completion,
    table: &mut BytesMut,
    buffers: &Arc<PieceBufferPool>,
    progress: &dyn Progress,
    completed: &mut usize,
) -> Result<(), CreateError> {
    *completed += 1;
    let batch = done.batch.ok_or(CreateError::Cancelled)?;
    let offset = done.start_piece * PIECE_DIGEST_LEN;
    table[offset..offset + batch.digests.len()].copy_from_slice(&batch.digests);
    for buf in batch.buffers {
        buffers.put(buf);
    }
    progress.on_bytes_hashed(done.segment_len as u64);
    Ok(())
}

fn read_error(file: &dyn FileSource) -> CreateError {
    CreateError::Io {
        path: file.display_path(),
    }
}
