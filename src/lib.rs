//! mktor - a BitTorrent v1 metainfo builder
//!
//! Given an ordered list of input files, this library produces a
//! bencoded `.torrent` document with a correctly computed piece-hash
//! table and a stable info-hash, byte-exact against standard BitTorrent
//! v1 parsers.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 canonical encoding
//! - [`hasher`] - SHA-1 kernel, worker pool, and the streaming piece
//!   pipeline
//! - [`metainfo`] - validation, dictionary assembly, info-hash
//! - [`creator`] - end-to-end orchestration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mktor::{FileSource, MemoryFile, NoProgress, TorrentCreator, TorrentOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), mktor::CreateError> {
//! let files: Vec<Arc<dyn FileSource>> = vec![Arc::new(MemoryFile::new(
//!     vec!["hello.txt".into()],
//!     &b"hello world"[..],
//! ))];
//!
//! let options = TorrentOptions {
//!     name: "hello".into(),
//!     ..TorrentOptions::default()
//! };
//!
//! let creator = TorrentCreator::new();
//! let torrent = creator.create(&files, &options, &NoProgress).await?;
//! println!("{}", torrent.info_hash);
//! # Ok(())
//! # }
//! ```

pub mod bencode;
pub mod constants;
pub mod creator;
pub mod hasher;
pub mod metainfo;
pub mod util;

pub use bencode::{encode, Value};
pub use creator::{default_name, CreatedTorrent, TorrentCreator};
pub use hasher::{
    calculate_hashes, sha1, DiskFile, FileSource, HashPool, JobId, JobRegistry, MemoryFile,
    NoProgress, PieceBufferPool, Progress, ProgressCounter, Sha1Kernel,
};
pub use metainfo::{
    auto_piece_length, build_info, build_outer, compute_info_hash, validate_options, CreateError,
    FileMeta, InfoHash, InfoHashCell, PieceLength, TorrentOptions,
};
pub use util::format_size;
