//! Checks run over a schema document and an expanded knowledge directory.

pub mod expansion;
pub mod knowledge;
pub mod schema;
