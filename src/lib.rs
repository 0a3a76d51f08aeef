//! Vareon library main entry point.
//!
//! Predicts whether a single-nucleotide variant is likely pathogenic from the
//! change it causes in the Evo2 likelihood of the surrounding reference window.

pub mod analysis;
pub mod calibrate;
pub mod classify;
pub mod common;
pub mod error;
pub mod scoring;
pub mod sequence;
pub mod server;
pub mod variant;

pub use error::{Error, Result};

/// Information about the build.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
