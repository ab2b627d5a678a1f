//! The torrent's identity hash.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::bencode::{encode, Value};
use crate::hasher;

/// A BitTorrent v1 info hash: the SHA-1 of the bencoded `info`
/// dictionary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The canonical 40-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .fold(String::with_capacity(40), |mut s, b| {
                use std::fmt::Write;
                let _ = write!(s, "{:02x}", b);
                s
            })
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Computes the info hash of a finished `info` dictionary.
///
/// Re-running this after a metadata-only edit (name, `private`,
/// `source`) is cheap: the piece table inside `info` is reused as-is,
/// so only the re-encoded dictionary is hashed.
pub fn compute_info_hash(info: &Value) -> InfoHash {
    InfoHash(hasher::sha1(&encode(info)))
}

/// Publishes info-hash results with last-issued-wins ordering.
///
/// Metadata edits re-issue the computation; results may resolve out of
/// order. Each computation takes an epoch from [`InfoHashCell::begin`],
/// and [`InfoHashCell::complete`] publishes a result only if no
/// later-issued computation has published before it.
#[derive(Debug, Default)]
pub struct InfoHashCell {
    epoch: AtomicU64,
    current: Mutex<Option<(u64, InfoHash)>>,
}

impl InfoHashCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a computation, returning its epoch.
    pub fn begin(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Publishes `hash` for `epoch`. Returns whether it was stored; a
    /// result older than the currently published one is discarded.
    pub fn complete(&self, epoch: u64, hash: InfoHash) -> bool {
        let mut current = self.current.lock();
        match *current {
            Some((stored, _)) if stored >= epoch => false,
            _ => {
                *current = Some((epoch, hash));
                true
            }
        }
    }

    /// The most recently published hash, if any.
    pub fn get(&self) -> Option<InfoHash> {
        let current = *self.current.lock();
        current.map(|(_, hash)| hash)
    }
}
