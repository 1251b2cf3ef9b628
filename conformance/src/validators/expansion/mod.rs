//! Expanded output validators.

pub mod leftovers;
