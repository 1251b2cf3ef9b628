//! Schema document validators.

pub mod declarations;
