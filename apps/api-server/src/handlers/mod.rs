//! HTTP handlers and route configuration.

mod advertisements;
mod auth;
mod health;


use actix_web::web;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/me", web::delete().to(auth::delete_me)),
            )
            .service(
                web::scope("/advertisements")
                    .route("", web::get().to(advertisements::list))
                    .route("", web::post().to(advertisements::create))
                    .route("/{id}", web::get().to(advertisements::retrieve))
                    .route("/{id}", web::put().to(advertisements::replace))
                    .route("/{id}", web::patch().to(advertisements::partial_update))
                    .route("/{id}", web::delete().to(advertisements::destroy)),
            ),
    );
}
