//! Server host for transport-agnostic API exposure
//!
//! The host owns the entity store, the compiled schema and the executor
//! bound to them. Exposures (GraphQL, health) only borrow it through an
//! `Arc`, so every transport sees the same state.

use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::executor::Executor;
use crate::core::schema::{Schema, SchemaDescription};
use crate::storage::{EntityStore, SeedData};

/// Host context containing all engine state
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerHost::from_config(&AppConfig::default())?);
/// let graphql_app = GraphQLExposure::build_router(host)?;
/// ```
pub struct ServerHost {
    /// The collections of users, posts and comments
    pub store: Arc<EntityStore>,

    /// Compiled schema governing which fields and operations are served
    pub schema: Arc<Schema>,

    /// Executor bound to `store` and `schema`
    pub executor: Executor,
}

impl ServerHost {
    /// Build the host from an already populated store and a compiled schema
    pub fn new(store: Arc<EntityStore>, schema: Arc<Schema>) -> Self {
        let executor = Executor::new(store.clone(), schema.clone());
        Self {
            store,
            schema,
            executor,
        }
    }

    /// Compile `description` and load `seed` into a fresh store
    pub fn from_parts(description: SchemaDescription, seed: SeedData) -> Result<Self> {
        let schema = Schema::compile(description)?;
        let store = EntityStore::from_seed(seed)?;
        Ok(Self::new(Arc::new(store), Arc::new(schema)))
    }

    /// Build the host from the schema and seed named by the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_parts(config.schema_description()?, config.seed_data()?)
    }
}
