//! Change detection between a candidate declaration and the active snapshot

use serde_json::Value;
use tracing::debug;

use crate::declaration::{ActiveSnapshot, Declaration};

/// Key/value equality of two serialized JSON documents. Field order is ignored.
pub fn structurally_equal(left: &str, right: &str) -> bool {
    let parsed = serde_json::from_str::<Value>(left)
        .and_then(|l| serde_json::from_str::<Value>(right).map(|r| (l, r)));

    match parsed {
        Ok((left, right)) => left == right,
        Err(e) => {
            debug!(error = %e, "Declaration comparison failed to parse");
            false
        }
    }
}

/// True when posting `candidate` would not change anything.
pub fn should_skip(candidate: &Declaration, active: &ActiveSnapshot) -> bool {
    !active.is_empty() && structurally_equal(candidate.serialized(), active.serialized())
}
