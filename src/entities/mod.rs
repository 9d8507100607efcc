//! Entity helper macros

#[macro_use]
pub mod macros;
