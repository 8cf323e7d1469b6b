//! Dependency-file classification and bounded diff collection.

pub mod classify;
pub mod collect;
