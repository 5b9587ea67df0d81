//! Failure codes and record types shared across `bulkseal` crates.

pub mod error;
pub mod protocol;

pub use error::FailureKind;
