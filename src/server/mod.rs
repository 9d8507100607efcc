//! Server module: the host holding engine state, the builder wiring it
//! into an axum router, and the protocol exposures

pub mod builder;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use host::ServerHost;

#[cfg(feature = "graphql")]
pub use exposure::GraphQLExposure;
