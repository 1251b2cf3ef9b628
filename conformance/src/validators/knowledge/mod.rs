//! Cross-document knowledge validators.

pub mod entities;
pub mod mappings;
pub mod references;
