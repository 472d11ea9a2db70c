//! Sunlapse Frame Model
//!
//! Defines the on-disk contract shared by acquisition and assembly:
//! - **Naming:** frames are stored as `<ddmmmyy>_sun_<sequence>.jpg`
//! - **Ordering:** the sequence number after the last underscore is the
//!   sort key, so externally produced frame sets order the same way
//! - **Catalog:** the fixed set of named image feeds a run can fetch from
//!
//! There is no index file. The directory listing is the database.

pub mod catalog;
pub mod naming;

pub use catalog::*;
pub use naming::*;
