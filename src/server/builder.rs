//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::health_routes;
use super::host::ServerHost;
use crate::config::AppConfig;
use crate::core::schema::SchemaDescription;
use crate::storage::SeedData;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for creating the HTTP server
///
/// Without explicit calls the built-in blog schema and demo seed are used.
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_seed(SeedData::from_yaml_file("seed.yaml")?)
///     .serve("127.0.0.1:4000")
///     .await?;
/// ```
pub struct ServerBuilder {
    schema: Option<SchemaDescription>,
    seed: Option<SeedData>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            schema: None,
            seed: None,
            custom_routes: Vec::new(),
        }
    }

    /// Create a builder using the schema and seed named by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new()
            .with_schema(config.schema_description()?)
            .with_seed(config.seed_data()?))
    }

    /// Replace the built-in schema description
    pub fn with_schema(mut self, schema: SchemaDescription) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Replace the built-in demo records
    pub fn with_seed(mut self, seed: SeedData) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let schema = self.schema.take().unwrap_or_else(SchemaDescription::blog);
        let seed = self.seed.take().unwrap_or_else(SeedData::demo);
        ServerHost::from_parts(schema, seed)
    }

    /// Build the final router: health routes, the GraphQL exposure and
    /// any custom routes, with request tracing
    pub fn build(mut self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);

        let mut app = health_routes();

        #[cfg(feature = "graphql")]
        {
            app = app.merge(super::exposure::GraphQLExposure::build_router(host.clone())?);
        }
        #[cfg(not(feature = "graphql"))]
        {
            let _ = &host;
            tracing::warn!("Built without the 'graphql' feature, only health routes are served");
        }

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
