//! Frame filename construction and sequence ordering.

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extension written for every acquired frame.
pub const FRAME_EXTENSION: &str = "jpg";

/// Infix between the date stamp and the sequence number.
pub const FRAME_INFIX: &str = "_sun_";

/// Extensions the assembler accepts (case-sensitive).
pub const CANDIDATE_EXTENSIONS: [&str; 2] = [".jpg", ".jpeg"];

fn sequence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_(\d+)\.jpg$").expect("sequence pattern is valid"))
}

/// A frame acquired on `date` with sequence number `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub date: NaiveDate,
    pub sequence: u64,
}

impl Frame {
    pub fn new(date: NaiveDate, sequence: u64) -> Self {
        Self { date, sequence }
    }

    /// Filename under which this frame is persisted.
    pub fn filename(&self) -> String {
        frame_filename(self.date, self.sequence)
    }
}

/// Lowercase `%d%b%y` date stamp, e.g. `07mar24`.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%d%b%y").to_string().to_lowercase()
}

/// Filename for a frame: `<ddmmmyy>_sun_<sequence>.jpg`.
pub fn frame_filename(date: NaiveDate, sequence: u64) -> String {
    format!(
        "{}{FRAME_INFIX}{sequence}.{FRAME_EXTENSION}",
        date_stamp(date)
    )
}

/// Ordering key of a frame filename.
///
/// Returns the integer between the last underscore and a trailing `.jpg`.
/// Anything else (other extensions, no digits, a number too large for
/// `u64`) yields 0 and therefore sorts first.
pub fn sequence_key(name: &str) -> u64 {
    sequence_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Whether a file name has one of the extensions the assembler reads.
pub fn is_frame_candidate(name: &str) -> bool {
    CANDIDATE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Sort file paths ascending by [`sequence_key`] of their file name.
///
/// Ties (including every non-matching name at key 0) fall back to the
/// file name so the order does not depend on directory listing order.
pub fn sort_by_sequence<P: AsRef<Path>>(paths: &mut [P]) {
    paths.sort_by_cached_key(|p| {
        let name = file_name_lossy(p.as_ref());
        (sequence_key(&name), name)
    });
}

pub(crate) fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
