//! Sunlapse Acquisition
//!
//! Periodically fetches a still image from a catalog feed and persists it
//! as a numbered frame. A run is driven by an [`AcquisitionSession`] on a
//! background Tokio task while the caller stays free to stop it.
//!
//! # Run lifecycle
//!
//! ```text
//!          start()                 quota reached
//!  Idle ─────────────▶ Running ─────────────────▶ Completed ─┐
//!                        │  │      stop()                     │
//!                        │  └────────────────────▶ Stopped  ──┼──▶ Idle
//!                        │         fetch/decode error         │
//!                        └───────────────────────▶ Failed  ───┘
//!
//!  Running, per iteration:
//!    check token ─▶ fetch ─▶ decode + persist ─▶ Saved ─▶ countdown (Countdown × N)
//! ```

pub mod countdown;
pub mod fetch;
pub mod session;

pub use countdown::*;
pub use fetch::*;
pub use session::*;
