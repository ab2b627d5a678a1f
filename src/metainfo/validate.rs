//! User-parameter validation.
//!
//! Checks run in a fixed order and report only the first failure, with
//! messages meant to be shown to the user verbatim.

use url::Url;

use super::build::TorrentOptions;
use super::error::CreateError;
use super::piece::PieceLength;
use crate::constants::{MAX_NAME_LEN, MAX_PIECE_LENGTH, MIN_PIECE_LENGTH, RESERVED_NAME_CHARS};

/// Splits a user-entered multi-entry field on runs of whitespace,
/// dropping empty tokens.
pub fn split_entries(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Checks the UI parameters, reporting the first failure.
pub fn validate_options(options: &TorrentOptions) -> Result<(), CreateError> {
    validate_name(&options.name)?;
    if let PieceLength::Explicit(len) = options.piece_length {
        validate_piece_length(len)?;
    }
    for tracker in split_entries(&options.trackers) {
        validate_tracker(tracker)?;
    }
    for seed in split_entries(&options.web_seeds) {
        validate_web_seed(seed)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), CreateError> {
    if name.is_empty() {
        return Err(CreateError::Validation(
            "Torrent name cannot be empty".into(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CreateError::Validation(
            "Torrent name cannot be longer than 255 characters".into(),
        ));
    }
    if name.contains(RESERVED_NAME_CHARS) {
        return Err(CreateError::Validation(
            r#"Torrent name cannot contain any of the following characters: < > : " \ / | ? *"#
                .into(),
        ));
    }
    Ok(())
}

fn validate_piece_length(len: u32) -> Result<(), CreateError> {
    if !len.is_power_of_two() || !(MIN_PIECE_LENGTH..=MAX_PIECE_LENGTH).contains(&len) {
        return Err(CreateError::Validation(
            "Piece size must be a power of two between 16 KiB and 16 MiB".into(),
        ));
    }
    Ok(())
}

/// Trackers must be absolute URLs whose path ends with the announce
/// endpoint. Stricter than BEP-3 requires, but what trackers actually
/// serve.
fn validate_tracker(tracker: &str) -> Result<(), CreateError> {
    let url = Url::parse(tracker)
        .map_err(|_| CreateError::Validation(format!("Invalid tracker URL: {tracker}")))?;
    let path = url.path();
    if !path.ends_with("announce") && !path.ends_with("announce/") {
        return Err(CreateError::Validation(format!(
            "Tracker URL must end with announce or announce/: {tracker}"
        )));
    }
    Ok(())
}

fn validate_web_seed(seed: &str) -> Result<(), CreateError> {
    Url::parse(seed)
        .map_err(|_| CreateError::Validation(format!("Invalid web seed URL: {seed}")))?;
    Ok(())
}
