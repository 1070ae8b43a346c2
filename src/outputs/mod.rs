//! Output files produced after each run.
//!
//! - [`json`]: `latest.json` snapshot of the digest and run statistics

pub mod json;
