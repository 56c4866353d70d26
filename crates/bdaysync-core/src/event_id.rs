//! Deterministic event identifiers.
//!
//! The identifier of a birthday event is the MD5 digest of the lowercased
//! `"{name}-{date}"` string, rendered as 32 lowercase hex characters. The
//! same name and date always produce the same identifier, which lets the
//! calendar reject a second insert of the same birthday.
//!
//! Google Calendar accepts identifiers of 5 to 1024 characters drawn from
//! base32hex (`a-v`, `0-9`); a hex digest satisfies both constraints.

/// Length of a generated identifier.
pub const EVENT_ID_LENGTH: usize = 32;

/// Derives the event identifier for a birthday.
///
/// `date` is the date string the event is built from (for year-less
/// birthdays, the placeholder-year form such as `1970-03-07`).
pub fn generate_event_id(name: &str, date: &str) -> String {
    let key = format!("{}-{}", name, date).to_lowercase();
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// Returns true if `id` is acceptable as a calendar event identifier.
pub fn is_valid_event_id(id: &str) -> bool {
    (5..=1024).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'v').contains(&b))
}
