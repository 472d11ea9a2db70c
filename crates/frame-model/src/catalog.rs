//! The fixed catalog of named solar image feeds.

use serde::Serialize;
use sunlapse_common::error::{SunlapseError, SunlapseResult};

/// One selectable image feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    /// Human-readable name shown to users.
    pub name: &'static str,
    /// Absolute HTTPS URL of the latest still image.
    pub url: &'static str,
}

const fn entry(name: &'static str, url: &'static str) -> SourceEntry {
    SourceEntry { name, url }
}

const SOURCES: &[SourceEntry] = &[
    entry(
        "SDO/HMI Continuum",
        "https://soho.nascom.nasa.gov/data/realtime/hmi_igr/1024/latest.jpg",
    ),
    entry(
        "SDO/HMI Magnetogram Image",
        "https://soho.nascom.nasa.gov/data/realtime/hmi_mag/1024/latest.jpg",
    ),
    entry(
        "EIT 171",
        "https://soho.nascom.nasa.gov/data/realtime/eit_171/1024/latest.jpg",
    ),
    entry(
        "EIT 195",
        "https://soho.nascom.nasa.gov/data/realtime/eit_195/1024/latest.jpg",
    ),
    entry(
        "EIT 284",
        "https://soho.nascom.nasa.gov/data/realtime/eit_284/1024/latest.jpg",
    ),
    entry(
        "EIT 304",
        "https://soho.nascom.nasa.gov/data/realtime/eit_304/1024/latest.jpg",
    ),
    entry(
        "SDO/AIA 193",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0193.jpg",
    ),
    entry(
        "SDO/AIA 304",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0304.jpg",
    ),
    entry(
        "SDO/AIA 171",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0171.jpg",
    ),
    entry(
        "SDO/AIA 211",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0211.jpg",
    ),
    entry(
        "SDO/AIA 131",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0131.jpg",
    ),
    entry(
        "SDO/AIA 335",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0335.jpg",
    ),
    entry(
        "SDO/AIA 094",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0094.jpg",
    ),
    entry(
        "SDO/AIA 1600",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_1600.jpg",
    ),
    entry(
        "SDO/AIA 1700",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_1700.jpg",
    ),
    entry(
        "SDO Composite 211-193-171",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_211193171.jpg",
    ),
    entry(
        "SDO Composite 304-211-171",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/f_304_211_171_1024.jpg",
    ),
    entry(
        "SDO Composite 094-335-193",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/f_094_335_193_1024.jpg",
    ),
    entry(
        "SDO HMI Magnetogram 171",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/f_HMImag_171_1024.jpg",
    ),
    entry(
        "SDO HMI Continuum Blue",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIBC.jpg",
    ),
    entry(
        "SDO HMI Continuum Intensitygram",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIIC.jpg",
    ),
    entry(
        "SDO HMI Continuum Full Disk",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIIF.jpg",
    ),
    entry(
        "SDO HMI Intensitygram",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMII.jpg",
    ),
    entry(
        "SDO HMI Dopplergram",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMID.jpg",
    ),
];

/// Read-only name-to-URL mapping of the available feeds.
#[derive(Debug, Clone, Copy)]
pub struct SourceCatalog {
    entries: &'static [SourceEntry],
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceCatalog {
    /// The built-in SOHO/SDO feeds.
    pub const fn builtin() -> Self {
        Self { entries: SOURCES }
    }

    /// Look up a feed by its exact name.
    pub fn lookup(&self, name: &str) -> SunlapseResult<&'static SourceEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| SunlapseError::UnknownSource {
                name: name.to_string(),
            })
    }

    /// URL of a feed, failing for unknown names.
    pub fn url_for(&self, name: &str) -> SunlapseResult<&'static str> {
        self.lookup(name).map(|e| e.url)
    }

    /// Feed names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|e| e.name)
    }

    pub fn entries(&self) -> &'static [SourceEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The feed selected when the user makes no choice.
    pub fn default_source(&self) -> &'static SourceEntry {
        &self.entries[0]
    }
}
