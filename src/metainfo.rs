//! Torrent metainfo assembly (BEP-3).
//!
//! Validation of user parameters, piece-length selection, composition
//! of the `info` and outer dictionaries, and the info-hash identity.

mod build;
mod error;
mod info_hash;
mod piece;
mod validate;

pub use build::{build_info, build_outer, FileMeta, TorrentOptions};
pub use error::CreateError;
pub use info_hash::{compute_info_hash, InfoHash, InfoHashCell};
pub use piece::{auto_piece_length, PieceLength};
pub use validate::{split_entries, validate_options};
