use actix_web::web;

use crate::handlers::{
    click_handler, create_handler, get_all_handler, get_by_code_handler, redirect_handler,
};

// Alias management API
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/urls")
            .route("", web::post().to(create_handler))
            .route("", web::get().to(get_all_handler))
            .route("/{code}", web::get().to(get_by_code_handler))
            .route("/{code}/clicks", web::post().to(click_handler)),
    );
}

// Public short links; registered last so it never shadows other routes
pub fn configure_redirect(cfg: &mut web::ServiceConfig) {
    cfg.route("/{code}", web::get().to(redirect_handler));
}
