//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services only see the [`crate::infrastructure::ClusterApi`] and
//! [`crate::infrastructure::ReleaseManager`] seams.

pub mod access_policy;
pub mod credentials;
pub mod executor;
pub mod orchestrator;

// Re-export commonly used types
pub use orchestrator::DeploymentOrchestrator;
