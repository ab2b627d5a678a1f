//! Tuning constants for the torrent builder.
//!
//! The values here mirror what mainstream clients produce: 16 KiB to
//! 16 MiB power-of-two pieces, 20-byte SHA-1 digests, and a read stage
//! that always moves 16 MiB at a time regardless of the piece size.

// ============================================================================
// Piece geometry
// ============================================================================

/// Smallest selectable piece length (16 KiB), as a power-of-two exponent.
pub const MIN_PIECE_LENGTH_EXP: u32 = 14;

/// Largest selectable piece length (16 MiB), as a power-of-two exponent.
pub const MAX_PIECE_LENGTH_EXP: u32 = 24;

/// Smallest selectable piece length in bytes.
pub const MIN_PIECE_LENGTH: u32 = 1 << MIN_PIECE_LENGTH_EXP;

/// Largest selectable piece length in bytes.
pub const MAX_PIECE_LENGTH: u32 = 1 << MAX_PIECE_LENGTH_EXP;

/// Target piece count for the automatic piece-length rule.
pub const AUTO_PIECE_TARGET: u64 = 1200;

/// Size of one piece digest in bytes (SHA-1).
pub const PIECE_DIGEST_LEN: usize = 20;

// ============================================================================
// Pipeline
// ============================================================================

/// Size of the macro-accumulator the pipeline reads into (16 MiB).
///
/// Reads always target this granularity, independent of the piece size,
/// so tiny files and tiny pieces still feed the hashers in large batches.
pub const MACRO_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Upper bound on parallel hash workers.
pub const MAX_HASH_WORKERS: usize = 8;

// ============================================================================
// Metainfo
// ============================================================================

/// Longest accepted torrent name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Characters that must not appear in a torrent name.
pub const RESERVED_NAME_CHARS: &[char] = &['<', '>', ':', '"', '\\', '/', '|', '?', '*'];

/// Identifier written into the `created by` field of every torrent.
pub const CREATED_BY: &str = "kimbatt.github.io/torrent-creator";
