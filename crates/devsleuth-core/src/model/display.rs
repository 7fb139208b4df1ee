/// Display formatting utilities: counts, FILETIME timestamps, GUIDs and
/// binary blobs, plus the case-insensitive text helpers shared by sorting
/// and search.
///
/// Timestamps are kept as raw FILETIME ticks (100 ns since 1601-01-01 UTC)
/// everywhere internally. `chrono` is only used at the formatting boundary
/// and for "now".
use chrono::{DateTime, Local, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// FILETIME ticks between 1601-01-01 and the Unix epoch.
const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;

/// FILETIME ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Binary values longer than this are truncated in their display form.
const BINARY_DISPLAY_LIMIT: usize = 64;

/// Format a device count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

// ── FILETIME ───────────────────────────────────────────────────────

/// Convert FILETIME ticks to a UTC timestamp. `None` when out of range.
pub fn filetime_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    let unix_ticks = ticks.checked_sub(FILETIME_UNIX_EPOCH)?;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a UTC timestamp to FILETIME ticks.
pub fn datetime_to_filetime(time: DateTime<Utc>) -> i64 {
    let secs = time.timestamp();
    let sub = i64::from(time.timestamp_subsec_nanos()) / 100;
    secs * TICKS_PER_SECOND + sub + FILETIME_UNIX_EPOCH
}

/// The current time as FILETIME ticks.
pub fn filetime_now() -> i64 {
    datetime_to_filetime(Utc::now())
}

/// Render FILETIME ticks in local time. Unrepresentable values fall back
/// to the raw tick count.
pub fn format_filetime(ticks: i64) -> String {
    match filetime_to_datetime(ticks) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => ticks.to_string(),
    }
}

// ── GUID / binary ──────────────────────────────────────────────────

/// Upper-case braced registry form: `{4D36E968-E325-11CE-BFC1-08002BE10318}`.
pub fn format_guid(guid: &Uuid) -> String {
    format!("{:X}", guid.braced())
}

/// Lower-case hex, truncated with a byte-count suffix for long blobs.
pub fn format_binary(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(BINARY_DISPLAY_LIMIT)];
    let mut out = String::with_capacity(shown.len() * 2 + 16);
    for b in shown {
        out.push_str(&format!("{b:02x}"));
    }
    if bytes.len() > BINARY_DISPLAY_LIMIT {
        out.push_str(&format!("... ({} bytes)", bytes.len()));
    }
    out
}

// ── Case-insensitive text ──────────────────────────────────────────

/// Case-insensitive ordering of two strings.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// `true` if `needle_lower` (already lower-cased) occurs in `haystack`,
/// ignoring case.
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle_lower.is_ascii() {
        return haystack.to_ascii_lowercase().contains(needle_lower);
    }
    haystack.to_lowercase().contains(needle_lower)
}
