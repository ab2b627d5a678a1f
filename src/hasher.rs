//! Streaming piece hashing.
//!
//! This module turns an ordered list of input files into the torrent's
//! piece-hash table. Files are read sequentially into a 16 MiB
//! macro-accumulator, sliced into pieces, and hashed in parallel by a
//! bounded pool of SHA-1 kernels. Piece indices are reserved at dispatch
//! time, so the table is deterministic in file order no matter how
//! workers interleave.

mod kernel;
mod pipeline;
mod pool;
mod progress;
#[cfg(target_arch = "x86_64")]
mod sha_ni;
mod source;

pub use kernel::{sha1, Sha1Kernel};
pub use pipeline::calculate_hashes;
pub use pool::{HashBatch, HashLease, HashPool, JobId, JobRegistry, PieceBufferPool};
pub use progress::{NoProgress, Progress, ProgressCounter};
pub use source::{DiskFile, FileSource, MemoryFile};

#[cfg(test)]
mod tests;
