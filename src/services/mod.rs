use std::sync::Arc;

use actix_web::web;

mod resolver;
mod shortener;

pub use resolver::{RedirectResolver, ResolutionOutcome};
pub use shortener::ShortenService;

use crate::{
    config::ShortenerConfig, repositories::AliasRegistry, utils::id_generator::RandomCodeGenerator,
};

/// Service Register
pub fn register(registry: Arc<AliasRegistry>, settings: &ShortenerConfig, cfg: &mut web::ServiceConfig) {
    let generator = Arc::new(RandomCodeGenerator::new(settings.code_length));
    let shorten_service = ShortenService::new(registry.clone(), generator, settings);
    let resolver = RedirectResolver::new(registry.clone(), settings.enforce_expiry);

    cfg.app_data(web::Data::new(shorten_service))
        .app_data(web::Data::new(resolver))
        .app_data(web::Data::from(registry));
}
