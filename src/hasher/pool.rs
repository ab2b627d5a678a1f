//! Bounded pool of SHA-1 workers with buffer recycling.
//!
//! The pool owns up to [`MAX_HASH_WORKERS`] kernel slots behind an
//! N-permit semaphore. Tokio's semaphore resolves waiters in arrival
//! order, which gives the FIFO worker-acquisition the pipeline relies
//! on. Input buffers move into the worker for the duration of a job and
//! come back with the digests so the caller can recycle them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use crossbeam::queue::ArrayQueue;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use super::kernel::Sha1Kernel;
use crate::constants::{MACRO_CHUNK_SIZE, MAX_HASH_WORKERS, PIECE_DIGEST_LEN};

/// Identifies one torrent-creation run for cancellation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

/// Mints job ids and tracks which one is active.
///
/// Cancellation is cooperative: superseding the active id makes every
/// pending acquisition for the old id resolve to "cancelled". Workers
/// that are already hashing run to completion; their output is dropped
/// by the caller's active-id check.
#[derive(Debug)]
pub struct JobRegistry {
    next: AtomicU64,
    active: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            active: AtomicU64::new(0),
        }
    }

    /// Mints a fresh job id and makes it the active one.
    pub fn begin(&self) -> JobId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.active.store(id, Ordering::Release);
        JobId(id)
    }

    /// Makes `job` the active id.
    pub fn set_active(&self, job: JobId) {
        self.active.store(job.0, Ordering::Release);
    }

    /// Whether `job` is still the active id.
    pub fn is_active(&self, job: JobId) -> bool {
        self.active.load(Ordering::Acquire) == job.0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of one hash batch: the concatenated 20-byte digests in input
/// order, plus the input buffers handed back for recycling.
pub struct HashBatch {
    pub digests: Bytes,
    pub buffers: Vec<BytesMut>,
}

/// Recycles piece-sized buffers between the pipeline and the workers.
pub struct PieceBufferPool {
    buffers: ArrayQueue<BytesMut>,
}

impl PieceBufferPool {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            buffers: ArrayQueue::new(capacity.max(1)),
        })
    }

    /// Takes a buffer with at least `size` capacity, allocating if the
    /// pool is empty.
    pub fn get(&self, size: usize) -> BytesMut {
        if let Some(mut buf) = self.buffers.pop() {
            if buf.capacity() < size {
                buf.reserve(size - buf.capacity());
            }
            return buf;
        }
        BytesMut::with_capacity(size)
    }

    /// Returns a buffer to the pool. Dropped silently if the pool is
    /// already full.
    pub fn put(&self, mut buf: BytesMut) {
        buf.clear();
        let _ = self.buffers.push(buf);
    }

    pub fn available(&self) -> usize {
        self.buffers.len()
    }
}

/// A bounded pool of SHA-1 kernels.
pub struct HashPool {
    kernels: Arc<ArrayQueue<Sha1Kernel>>,
    permits: Arc<Semaphore>,
    jobs: Arc<JobRegistry>,
    workers: usize,
}

impl HashPool {
    /// Creates a pool with one worker per hardware thread, capped at
    /// [`MAX_HASH_WORKERS`].
    pub fn new(jobs: Arc<JobRegistry>) -> Arc<Self> {
        let workers = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1);
        Self::with_workers(workers, jobs)
    }

    /// Creates a pool with an explicit worker count (clamped to
    /// `1..=MAX_HASH_WORKERS`).
    pub fn with_workers(workers: usize, jobs: Arc<JobRegistry>) -> Arc<Self> {
        let workers = workers.clamp(1, MAX_HASH_WORKERS);
        let kernels = Arc::new(ArrayQueue::new(workers));
        for _ in 0..workers {
            let _ = kernels.push(Sha1Kernel::with_capacity(MACRO_CHUNK_SIZE));
        }
        Arc::new(Self {
            kernels,
            permits: Arc::new(Semaphore::new(workers)),
            jobs,
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    /// Waits for a free worker, in arrival order.
    ///
    /// Returns `None` if `job` is no longer the active id at the moment
    /// the worker becomes available.
    pub async fn acquire(&self, job: Option<JobId>) -> Option<HashLease> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;
        if let Some(job) = job {
            if !self.jobs.is_active(job) {
                trace!(?job, "hash job superseded at worker acquisition");
                return None;
            }
        }
        // Invariant: a held permit means a kernel slot is available; the
        // fallback only covers a slot lost to a panicked batch.
        let kernel = self
            .kernels
            .pop()
            .unwrap_or_else(|| Sha1Kernel::with_capacity(MACRO_CHUNK_SIZE));
        Some(HashLease {
            kernel: Some(kernel),
            kernels: self.kernels.clone(),
            _permit: permit,
        })
    }

    /// Hashes each input in order and returns the digests plus the
    /// original buffers, or `None` if the job was cancelled before a
    /// worker picked it up.
    pub async fn compute_hashes(
        &self,
        inputs: Vec<BytesMut>,
        job: Option<JobId>,
    ) -> Option<HashBatch> {
        let lease = self.acquire(job).await?;
        lease.compute(inputs).await
    }
}

/// Exclusive use of one pooled kernel.
///
/// The kernel returns to the pool when the lease drops, before the
/// semaphore permit is released.
pub struct HashLease {
    kernel: Option<Sha1Kernel>,
    kernels: Arc<ArrayQueue<Sha1Kernel>>,
    _permit: OwnedSemaphorePermit,
}

impl HashLease {
    /// Runs the batch on a blocking thread.
    ///
    /// Digests are concatenated in input order. Returns `None` only if
    /// the blocking task failed, which callers treat as a cancelled job.
    pub async fn compute(mut self, inputs: Vec<BytesMut>) -> Option<HashBatch> {
        let mut kernel = self.kernel.take()?;
        let joined = tokio::task::spawn_blocking(move || {
            let mut digests = Vec::with_capacity(inputs.len() * PIECE_DIGEST_LEN);
            for piece in &inputs {
                digests.extend_from_slice(&kernel.hash(piece));
            }
            (kernel, digests, inputs)
        })
        .await;

        match joined {
            Ok((kernel, digests, buffers)) => {
                self.kernel = Some(kernel);
                Some(HashBatch {
                    digests: Bytes::from(digests),
                    buffers,
                })
            }
            Err(_) => {
                // The batch panicked and took its kernel with it; seed a
                // replacement so the pool keeps its worker count.
                self.kernel = Some(Sha1Kernel::with_capacity(MACRO_CHUNK_SIZE));
                None
            }
        }
    }
}

impl Drop for HashLease {
    fn drop(&mut self) {
        if let Some(kernel) = self.kernel.take() {
            let _ = self.kernels.push(kernel);
        }
    }
}
