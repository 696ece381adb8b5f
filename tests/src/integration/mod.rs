//! Cross-crate deployment flows.

pub mod cross_module;
pub mod deployment;
pub mod resume;
pub mod serialization;
pub mod validation;
