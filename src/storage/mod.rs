//! Storage for the entity collections

pub mod in_memory;
pub mod seed;

pub use in_memory::{Collections, EntityStore};
pub use seed::SeedData;
