use std::{sync::Arc, time::Instant};

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{debug, info};

use crate::{
    config::{Config, Environment},
    errors::AppError,
    middleware::RequestTelemetry,
    repositories::AliasRegistry,
    routes, services, store,
    telemetry::{LogLevel, Telemetry},
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> Result<(), AppError> {
    // Configure log level based on environment and config
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

pub async fn server() -> AppResult<()> {
    // Load application configuration
    let config = Config::load()?;

    // Setup enhanced logging based on configuration
    setup_logging(&config)?;

    // Capture start time for uptime calculation
    let start_time = Instant::now();

    // Log startup information
    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    // One registry shared by every worker
    let registry = Arc::new(AliasRegistry::load(store::connect(&config.store)));
    info!("Loaded {} aliases", registry.len());

    let telemetry = Telemetry::from_config(
        &config.telemetry,
        format!("{}/{}", config.app.name, config.app.version),
    );
    telemetry.emit(
        LogLevel::Info,
        "app",
        format!("{} v{} starting", config.app.name, config.app.version),
    );

    // Determine if we should enable more verbose logging
    let enable_debug_logging = config.app.environment != Environment::Production;

    // Create a cloned config for the closure
    let app_config = config.clone();

    // Determine log format based on environment
    let log_format = if enable_debug_logging {
        // Detailed format for development/testing
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{x-request-id}o"
    } else {
        // Simple format for production
        "%a \"%r\" %s %b %T"
    };

    // Start the HTTP server
    HttpServer::new(move || {
        let registry = registry.clone();
        let shortener = app_config.shortener.clone();

        App::new()
            .app_data(web::Data::new(AppState {
                start_time,
                version: app_config.app.version.clone(),
            }))
            .app_data(web::Data::new(app_config.shortener.clone()))
            .app_data(web::Data::new(telemetry.clone()))
            .wrap(RequestTelemetry::new(telemetry.clone()))
            .wrap(Logger::new(log_format))
            .configure(move |cfg| services::register(registry, &shortener, cfg))
            // Configure routes
            .configure(routes::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
