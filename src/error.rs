// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for the ADSP-2100 core
//!
//! Nothing in here is produced while instructions execute: the core is
//! fail-silent, and reports trouble through ASTAT/SSTAT like the silicon does.
//! These errors only come out of host-side operations (loading images,
//! restoring snapshots, driving interrupt lines).

use crate::cpu::bus::Region;
use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the ADSP-2100 core.
#[derive(Debug, Error)]
pub enum Error {
    /// Tried to drive an interrupt line the core doesn't have
    #[error("interrupt line {line} does not exist (expected 0..4)")]
    InvalidIrqLine {
        /// The offending line
        line: usize,
    },
    /// A snapshot was the wrong size
    #[error("snapshot is {got} bytes long, expected {expected}")]
    SnapshotLength {
        /// Bytes required by the snapshot layout
        expected: usize,
        /// Bytes actually provided
        got: usize,
    },
    /// A snapshot decoded, but describes an impossible machine
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot {
        /// What was wrong with it
        reason: String,
    },
    /// A program image wasn't made of whole 24-bit words
    #[error("program image of {len} bytes is not a whole number of 24-bit words")]
    InvalidImage {
        /// Length of the offending image
        len: usize,
    },
    /// The region you asked for was not defined
    #[error("region {region} is not present on bus")]
    MissingRegion {
        /// The offending [Region]
        region: Region,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
