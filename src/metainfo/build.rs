//! Metainfo dictionary assembly.
//!
//! Composes the `info` dictionary and the outer dictionary from
//! validated parameters, the file listing, and the piece table produced
//! by the pipeline. The `info` dictionary is a pure function of its
//! inputs; optional keys are omitted entirely rather than emitted
//! empty.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::piece::PieceLength;
use super::validate::split_entries;
use crate::bencode::Value;
use crate::constants::CREATED_BY;

/// The UI parameter record the collaborator fills in.
#[derive(Debug, Clone)]
pub struct TorrentOptions {
    /// Torrent name; becomes `info.name`.
    pub name: String,
    /// Piece length selection.
    pub piece_length: PieceLength,
    /// Emit `private = 1` in the info dictionary.
    pub private: bool,
    /// Cross-seeding source tag; emitted only when non-empty.
    pub source: String,
    /// Tracker URLs as raw whitespace-separated text.
    pub trackers: String,
    /// Web seed URLs as raw whitespace-separated text.
    pub web_seeds: String,
    /// Free-form comment; emitted only when non-empty.
    pub comment: String,
    /// Stamp the outer dictionary with the current time.
    pub set_creation_date: bool,
}

impl Default for TorrentOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            piece_length: PieceLength::Auto,
            private: false,
            source: String::new(),
            trackers: String::new(),
            web_seeds: String::new(),
            comment: String::new(),
            set_creation_date: true,
        }
    }
}

/// One file of the torrent as the assembler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Path segments relative to the torrent root.
    pub path: Vec<String>,
    /// Length in bytes.
    pub length: u64,
}

/// Whether the listing is a bare single file (as opposed to a folder,
/// even a folder holding one file).
fn is_single_file(files: &[FileMeta]) -> bool {
    files.len() == 1 && files[0].path.len() == 1
}

/// Builds the `info` dictionary.
///
/// Single-file mode gets a `length` key; folder mode gets a `files`
/// list preserving pipeline order. `private` and `source` appear only
/// when set.
pub fn build_info(
    options: &TorrentOptions,
    files: &[FileMeta],
    piece_length: u32,
    piece_table: Bytes,
) -> Value {
    let mut info = BTreeMap::new();

    info.insert(
        Bytes::from_static(b"name"),
        Value::string(&options.name),
    );
    info.insert(
        Bytes::from_static(b"piece length"),
        Value::Integer(piece_length as i64),
    );
    info.insert(Bytes::from_static(b"pieces"), Value::Bytes(piece_table));

    if is_single_file(files) {
        info.insert(
            Bytes::from_static(b"length"),
            Value::Integer(files[0].length as i64),
        );
    } else {
        let list = files
            .iter()
            .map(|file| {
                let mut entry = BTreeMap::new();
                entry.insert(
                    Bytes::from_static(b"length"),
                    Value::Integer(file.length as i64),
                );
                entry.insert(
                    Bytes::from_static(b"path"),
                    Value::List(file.path.iter().map(|seg| Value::string(seg)).collect()),
                );
                Value::Dict(entry)
            })
            .collect();
        info.insert(Bytes::from_static(b"files"), Value::List(list));
    }

    if options.private {
        info.insert(Bytes::from_static(b"private"), Value::Integer(1));
    }
    if !options.source.is_empty() {
        info.insert(
            Bytes::from_static(b"source"),
            Value::string(&options.source),
        );
    }

    Value::Dict(info)
}

/// Builds the outer dictionary around a finished `info` value.
pub fn build_outer(options: &TorrentOptions, info: Value) -> Value {
    let mut root = BTreeMap::new();
    root.insert(Bytes::from_static(b"info"), info);

    let trackers = split_entries(&options.trackers);
    if let Some(first) = trackers.first() {
        root.insert(Bytes::from_static(b"announce"), Value::string(first));
        let tiers = trackers
            .iter()
            .map(|tracker| Value::List(vec![Value::string(tracker)]))
            .collect();
        root.insert(Bytes::from_static(b"announce-list"), Value::List(tiers));
    }

    let web_seeds = split_entries(&options.web_seeds);
    if !web_seeds.is_empty() {
        let seeds = web_seeds.iter().map(|seed| Value::string(seed)).collect();
        root.insert(Bytes::from_static(b"url-list"), Value::List(seeds));
    }

    if !options.comment.is_empty() {
        root.insert(
            Bytes::from_static(b"comment"),
            Value::string(&options.comment),
        );
    }

    root.insert(Bytes::from_static(b"created by"), Value::string(CREATED_BY));

    if options.set_creation_date {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        root.insert(
            Bytes::from_static(b"creation date"),
            Value::Integer(timestamp),
        );
    }

    Value::Dict(root)
}
