pub mod artifact;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod runner;
pub mod workspace;

pub use outcome::ScanOutcome;
pub use pipeline::{ScanOptions, prepare_invocation, run_scan};
