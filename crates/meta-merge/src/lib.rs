//! Applies diff logs to a target branch.
//!
//! Rows are grouped `path → timestamp` so older pull requests apply
//! first, then each file gets one parse-splice-reconstruct cycle per
//! request. The resulting [`MergeReport`] is the run's change log.

pub mod driver;
pub mod error;
pub mod log;

pub use driver::{FileOutcome, MergeOptions, MergeReport, Merger};
pub use error::{Error, Result};
pub use log::MergeLog;
