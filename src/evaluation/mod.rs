//! Policy and score evaluation.
//!
//! Classification summaries for a given threshold and read-only
//! diagnostics of the supplied default probabilities.

pub mod calibration;
pub mod classification;

pub use calibration::{Calibrator, ScoreDiagnostics};
pub use classification::{summarize, ClassificationSummary, ConfusionMatrix};
