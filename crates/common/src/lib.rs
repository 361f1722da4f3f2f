//! Reusable utilities shared by the smartnode services, such as setting up the tracing framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
