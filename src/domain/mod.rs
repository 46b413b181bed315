//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod release;
pub mod restart;
pub mod status;
pub mod values;

// Re-export commonly used types
pub use release::{DeployOutcome, DeployReport, ProvisionWarning, ReleaseInfo, ReleaseOptions};
pub use status::{ApplicationStatus, DatabaseStatus, StatusReport};
pub use values::DesiredValues;
