// src/output/mod.rs
//! Document delivery with planning separated from execution.
//!
//! Planning builds a [`OutputPlan`] out of pure data; [`deliver`] is the
//! only place file I/O happens, which keeps the rest of the export flow
//! testable without touching the filesystem.

mod types;
mod writer;

pub use types::{CompletedOperation, DeliveryTarget, FailedOperation, OutputPlan, OutputReport};
pub use writer::deliver;
