use actix_web::{
    http::header::{LOCATION, REFERER},
    web, HttpRequest, HttpResponse, Responder,
};
use chrono::Utc;
use log::{debug, info};
use serde_json::json;
use validator::Validate;

use crate::{
    config::ShortenerConfig,
    errors::AppError,
    models::{AliasQueryParams, ShortenBatchDto},
    repositories::AliasRegistry,
    services::{RedirectResolver, ResolutionOutcome, ShortenService},
    telemetry::{LogLevel, Telemetry},
    types::Result,
};

fn referrer(req: &HttpRequest) -> Option<&str> {
    req.headers().get(REFERER).and_then(|v| v.to_str().ok())
}

/// Create aliases for a batch of URLs
pub async fn create_handler(
    dto: web::Json<ShortenBatchDto>,
    service: web::Data<ShortenService>,
    settings: web::Data<ShortenerConfig>,
    telemetry: web::Data<Telemetry>,
) -> Result<impl Responder> {
    let dto = dto.into_inner();
    dto.validate()?;

    if dto.urls.len() > settings.max_batch_size {
        return Err(AppError::Validation(format!(
            "At most {} URLs can be shortened at once, got {}",
            settings.max_batch_size,
            dto.urls.len()
        )));
    }

    let records = service.process(&dto.urls).map_err(|e| {
        telemetry.emit(LogLevel::Warn, "handler", format!("Shorten rejected: {}", e));
        AppError::from(e)
    })?;

    telemetry.emit(
        LogLevel::Info,
        "handler",
        format!("Created {} aliases", records.len()),
    );

    Ok(HttpResponse::Created().json(json!({
        "data": records,
        "message": format!("Successfully created {} URLs", records.len()),
    })))
}

/// List every alias with its statistics, in creation order
pub async fn get_all_handler(
    query: web::Query<AliasQueryParams>,
    registry: web::Data<AliasRegistry>,
) -> Result<impl Responder> {
    let records: Vec<_> = registry
        .all_records()
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "data": records,
        "message": "Successfully retrieved URLs",
    })))
}

/// Get one alias by its short code
pub async fn get_by_code_handler(
    code: web::Path<String>,
    registry: web::Data<AliasRegistry>,
) -> Result<impl Responder> {
    let code = code.into_inner();
    let record = registry
        .find_by_code(&code)
        .ok_or_else(|| AppError::NotFound(format!("No alias with short code '{}'", code)))?;

    Ok(HttpResponse::Ok().json(json!({
        "data": record,
        "message": "Successfully retrieved URL",
    })))
}

/// Record a click without redirecting
pub async fn click_handler(
    code: web::Path<String>,
    req: HttpRequest,
    resolver: web::Data<RedirectResolver>,
) -> Result<impl Responder> {
    let record = resolver.register_click(&code, referrer(&req), Utc::now())?;

    Ok(HttpResponse::Ok().json(json!({
        "data": record,
        "message": "Successfully registered click",
    })))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    req: HttpRequest,
    resolver: web::Data<RedirectResolver>,
    telemetry: web::Data<Telemetry>,
) -> Result<impl Responder> {
    let short_code = path.into_inner();
    debug!("Redirect requested for code: {}", short_code);

    match resolver.resolve(&short_code, referrer(&req), Utc::now()) {
        ResolutionOutcome::Redirect(original_url) => {
            telemetry.emit(
                LogLevel::Info,
                "handler",
                format!("Redirected '{}'", short_code),
            );
            Ok(HttpResponse::TemporaryRedirect()
                .insert_header((LOCATION, original_url))
                .finish())
        }
        ResolutionOutcome::NotFound => {
            telemetry.emit(
                LogLevel::Warn,
                "handler",
                format!("Unknown short code '{}'", short_code),
            );
            Err(AppError::NotFound(format!(
                "No alias with short code '{}'",
                short_code
            )))
        }
        ResolutionOutcome::Expired { code, expired_at } => {
            info!("URL with code '{}' has expired", code);
            Err(AppError::Expired(format!(
                "URL with code '{}' expired at {}",
                code,
                expired_at.to_rfc3339()
            )))
        }
    }
}
