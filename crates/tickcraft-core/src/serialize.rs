//! Persisted snapshots of [`State`].
//!
//! A snapshot is a JSON document with a version header:
//!
//! ```json
//! { "version": 1, "state": { "tick": 0, "inventory": {}, "queue": [],
//!   "robots": {}, "nextRobotId": 0 } }
//! ```
//!
//! Decoding is strict: unknown fields are rejected, the version must match,
//! and the decoded state must pass [`State::validate`]. Every failure comes
//! back as a [`SnapshotError`] so the caller can offer a reset instead of
//! crashing.

use crate::state::{State, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current format version. Increment when breaking the document layout.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("invalid state: {0}")]
    Invalid(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Only the version, so it can be checked before the state is decoded.
#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a State,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    /// Already checked through [`Header`].
    #[serde(rename = "version")]
    _version: u32,
    state: State,
}

fn check_version(version: u32) -> Result<(), SnapshotError> {
    if version > FORMAT_VERSION {
        return Err(SnapshotError::FutureVersion(version));
    }
    if version < FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Serialize `state` as a pretty-printed snapshot document.
pub fn to_json(state: &State) -> Result<String, SnapshotError> {
    let doc = SnapshotRef {
        version: FORMAT_VERSION,
        state,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Decode and validate a snapshot document.
pub fn from_json(json: &str) -> Result<State, SnapshotError> {
    decode(json).inspect_err(|e| warn!(error = %e, "Rejected snapshot"))
}

fn decode(json: &str) -> Result<State, SnapshotError> {
    let header: Header = serde_json::from_str(json)?;
    check_version(header.version)?;
    let snapshot: Snapshot = serde_json::from_str(json)?;
    snapshot.state.validate()?;
    info!(
        tick = snapshot.state.tick(),
        robots = snapshot.state.robot_count(),
        queued = snapshot.state.queue().len(),
        "Loaded snapshot"
    );
    Ok(snapshot.state)
}
