//! Bencode encoding (BEP-3)
//!
//! Bencode is the canonical serialization used by BitTorrent metainfo
//! files. Only encoding is provided; the builder never needs to parse.
//! Encoding is deterministic: dictionary entries are emitted in
//! lexicographic byte order of their keys, so the same value always
//! produces the same bytes regardless of insertion order.

mod encode;
mod value;

pub use encode::{encode, encode_into};
pub use value::Value;
