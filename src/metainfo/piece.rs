use crate::constants::{
    AUTO_PIECE_TARGET, MAX_PIECE_LENGTH_EXP, MIN_PIECE_LENGTH, MIN_PIECE_LENGTH_EXP,
};
use crate::util::format_size;

/// Piece length selection: automatic or an explicit power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PieceLength {
    /// Derive the piece length from the total size, targeting about
    /// 1200 pieces.
    #[default]
    Auto,
    /// Use exactly this many bytes per piece.
    Explicit(u32),
}

impl PieceLength {
    /// Resolves the choice against the input's total size.
    pub fn resolve(self, total_size: u64) -> u32 {
        match self {
            PieceLength::Explicit(len) => len,
            PieceLength::Auto => auto_piece_length(total_size),
        }
    }

    /// The selectable sizes with human-readable labels, 16 KiB through
    /// 16 MiB.
    pub fn options() -> Vec<(u32, String)> {
        (MIN_PIECE_LENGTH_EXP..=MAX_PIECE_LENGTH_EXP)
            .map(|exp| {
                let len = 1u32 << exp;
                (len, format_size(len as u64))
            })
            .collect()
    }
}

/// Picks the power-of-two piece length whose piece count lands nearest
/// [`AUTO_PIECE_TARGET`], clamped to 16 KiB..=16 MiB.
///
/// Inputs of 19200 bytes or less all resolve to 16 KiB pieces; the
/// clamp dominates the rounded factor there.
pub fn auto_piece_length(total_size: u64) -> u32 {
    if total_size == 0 {
        return MIN_PIECE_LENGTH;
    }
    let factor = (total_size as f64 / AUTO_PIECE_TARGET as f64).log2().round();
    let exp = (factor.max(0.0) as u32).clamp(MIN_PIECE_LENGTH_EXP, MAX_PIECE_LENGTH_EXP);
    1 << exp
}
