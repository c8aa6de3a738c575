//! Decoded badge payload handling.

use uuid::Uuid;

/// Pipe-delimited payload printed into the badge QR code:
/// `personId|locationTag|sprintTag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgePayload {
    pub person_id: String,
    pub location_tag: String,
    pub sprint_tag: String,
}

impl BadgePayload {
    /// Splits a decoded QR string. Missing segments become empty strings and
    /// fail the format check downstream; parsing itself never rejects.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(3, '|');
        Self {
            person_id: parts.next().unwrap_or_default().to_string(),
            location_tag: parts.next().unwrap_or_default().to_string(),
            sprint_tag: parts.next().unwrap_or_default().to_string(),
        }
    }
}

/// Badges printed before the current ID scheme carry non-UUID identifiers.
/// Only the canonical hyphenated form is accepted; the 36-byte length gate
/// rejects the simple/braced/urn renderings `Uuid` would otherwise parse.
pub fn is_canonical_badge_id(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}
