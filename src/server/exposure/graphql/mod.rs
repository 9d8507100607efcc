//! GraphQL API exposure
//!
//! `POST /graphql` executes a document against the host's executor and
//! `GET /graphql/schema` serves the schema as SDL. Responses always use
//! HTTP 200; failures are reported in the `errors` array.

mod executor;
mod utils;

pub use executor::GraphQLExecutor;

use crate::server::host::ServerHost;
use anyhow::Result;
use axum::{
    Router,
    extract::{Extension, Json as AxumJson},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLRequestBody {
    query: String,
    #[serde(default)]
    variables: Option<Map<String, Value>>,
    #[serde(default)]
    operation_name: Option<String>,
}

/// GraphQL API exposure implementation
pub struct GraphQLExposure;

impl GraphQLExposure {
    /// Build the GraphQL router from a host
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let host = Arc::new(ServerBuilder::new().build_host()?);
    /// let graphql_app = GraphQLExposure::build_router(host)?;
    /// ```
    pub fn build_router(host: Arc<ServerHost>) -> Result<Router> {
        let executor = Arc::new(GraphQLExecutor::new(host.clone()));

        let router = Router::new()
            .route("/graphql", post(graphql_handler))
            .route("/graphql/schema", get(graphql_schema))
            .layer(Extension(executor))
            .layer(Extension(host));

        Ok(router)
    }
}

/// Handler for GraphQL queries and mutations
async fn graphql_handler(
    Extension(executor): Extension<Arc<GraphQLExecutor>>,
    AxumJson(request): AxumJson<GraphQLRequestBody>,
) -> impl IntoResponse {
    AxumJson(executor.execute(
        &request.query,
        request.variables,
        request.operation_name.as_deref(),
    ))
}

/// Handler for GraphQL schema SDL export
async fn graphql_schema(Extension(host): Extension<Arc<ServerHost>>) -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        host.schema.to_sdl(),
    )
}
