//! Gallery Server - image gallery backend.
//!
//! This binary connects to the document store and starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_server::{
    config::Config,
    server::{create_router, RouterConfig},
    store::{DocumentStore, MemoryStore, MongoStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Gallery Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Session TTL: {}h", config.session_ttl_hours);
    info!("  Password cost: {}", config.password_cost);
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }

    if config.memory_store {
        warn!("  Store: IN-MEMORY - data is lost on restart");
        return serve(MemoryStore::new(), &config).await;
    }

    let store = match connect_mongo(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("  Failed to connect to MongoDB: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - DB_USER and DB_PASS are correct");
            error!("    - The cluster '{}' is reachable", config.db_cluster);
            error!("    - Your IP is allowed by the deployment's network rules");
            return ExitCode::FAILURE;
        }
    };

    serve(store, &config).await
}

/// Connect to MongoDB, check connectivity and prepare indexes.
async fn connect_mongo(config: &Config) -> Result<MongoStore, String> {
    let uri = config
        .connection_uri()
        .ok_or_else(|| "no connection string configured".to_string())?;
    let database = config
        .database_name()
        .ok_or_else(|| "no database name configured".to_string())?;

    info!("  Store: MongoDB (database '{}')", database);
    info!("");
    info!("Connecting to MongoDB...");

    let store = MongoStore::connect(&uri, database)
        .await
        .map_err(|e| e.to_string())?;
    store.ping().await.map_err(|e| e.to_string())?;
    info!("  Pinged your deployment. You successfully connected to MongoDB!");

    store.ensure_indexes().await.map_err(|e| e.to_string())?;

    Ok(store)
}

/// Build the router around `store`, bind and serve until shutdown.
async fn serve<S>(store: S, config: &Config) -> ExitCode
where
    S: DocumentStore + 'static,
{
    let router = create_router(store, build_router_config(config));
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("Server is running on http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gallery_server=debug,tower_http=debug"
    } else {
        "gallery_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.secret_key_or_empty())
        .with_session_ttl(config.session_ttl())
        .with_password_cost(config.password_cost)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
