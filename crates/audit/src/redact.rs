//! Sensitive-field redaction.
//!
//! Snapshots are scrubbed before they are persisted or displayed. The value
//! is replaced with a fixed marker rather than the key being dropped, so the
//! shape of a change stays visible without leaking the secret.

use serde_json::Value;

use crate::entry::Snapshot;

/// Marker substituted for redacted values.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Substring patterns that mark a field name as sensitive.
const SENSITIVE_PATTERNS: [&str; 3] = ["password", "token", "secret"];

/// Whether a field name must never be stored in clear.
///
/// Case-insensitive. Matches any name containing `password`, `token` or
/// `secret` (covers `hashed_password`, `api_token`, `refresh_token`, ...)
/// plus the exact name `hash`.
pub fn is_sensitive_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "hash" || SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Replace every sensitive value in a snapshot with [`REDACTION_MARKER`].
pub fn redact_snapshot(values: &Snapshot) -> Snapshot {
    values
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive_field(key) {
                Value::String(REDACTION_MARKER.to_string())
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
