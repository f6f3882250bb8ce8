use actix_web::{web, HttpResponse, Responder};

use crate::errors::AppError;
use crate::repositories::AliasRegistry;
use crate::types::{AppState, HealthStatus, ResponsePayload};

mod alias;

// Handler function for the root route "/"
async fn index() -> impl Responder {
    let welcome_message = ResponsePayload {
        status: 200,
        message: String::from("Welcome! POST your URLs to /api/urls to get short aliases."),
    };

    // Return the struct as JSON
    HttpResponse::Ok().json(welcome_message)
}

// Handler function for the health check endpoint
async fn health_check(data: web::Data<AppState>, registry: web::Data<AliasRegistry>) -> impl Responder {
    // Calculate uptime in seconds
    let uptime = data.start_time.elapsed().as_secs();

    let status = HealthStatus {
        status: String::from("OK"),
        version: data.version.clone(),
        uptime_seconds: uptime,
        alias_count: registry.len(),
    };

    // Return the status as JSON
    HttpResponse::Ok().json(status)
}

// Malformed JSON bodies get the same error payload as every other failure
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(32 * 1024)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

// Configure all routes function
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    cfg.route("/", web::get().to(index));
    cfg.route("/health", web::get().to(health_check));
    alias::configure_routes(cfg);
    alias::configure_redirect(cfg);
}
