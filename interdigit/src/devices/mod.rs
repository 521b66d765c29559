//! Leaf device generators.

pub mod fet;
pub mod tapring;
