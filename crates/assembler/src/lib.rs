//! Sunlapse Assembler
//!
//! Turns a directory of numbered frames into a single video file.
//!
//! # Pipeline
//!
//! ```text
//! <dir>/*.jpg|*.jpeg ──▶ order by sequence ──▶ probe first frame (W×H)
//!                                                     │
//!                          ┌──────────────────────────┘
//!                          ▼
//!            decode each frame ──▶ VideoEncoder (mp4v, fixed fps, W×H)
//!                  │ undecodable                        │
//!                  ▼                                    ▼
//!            skipped (warning)                   <dir>/output.mp4
//! ```

pub mod assemble;
pub mod encoder;

pub use assemble::*;
pub use encoder::*;
