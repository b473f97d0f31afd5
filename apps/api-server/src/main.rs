//! # Adboard API Server
//!
//! Advertisement board over actix-web: anonymous browsing of open listings,
//! authenticated owners managing their own.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::NormalizePath, web};
use tracing_actix_web::TracingLogger;

use adboard_core::ports::{PasswordService, TokenService};
use adboard_infra::{Argon2PasswordService, JwtTokenService};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::{AppConfig, ThrottleConfig};
use middleware::throttle::ThrottleMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_open_advertisements = config.max_open_advertisements,
        "Starting Adboard API server"
    );

    if config.jwt.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens are signed with the built-in development secret");
    }

    let state = AppState::new(&config).await?;
    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::default());
    let throttle = build_throttle(config.throttle, token_service.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(throttle.clone())
            .wrap(RequestIdMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "rate-limit")]
fn build_throttle(config: ThrottleConfig, tokens: Arc<dyn TokenService>) -> ThrottleMiddleware {
    use adboard_infra::{InMemoryRateLimiter, RateLimitConfig};
    use middleware::throttle::Throttle;
    use std::time::Duration;

    let limiters = InMemoryRateLimiter::new(&RateLimitConfig::per_minute(config.anon_per_minute))
        .and_then(|anon| {
            InMemoryRateLimiter::new(&RateLimitConfig::per_minute(config.user_per_minute))
                .map(|user| (Arc::new(anon), Arc::new(user)))
        });

    let (anon, user) = match limiters {
        Ok(limiters) => limiters,
        Err(e) => {
            tracing::warn!(error = %e, "Throttling disabled");
            return ThrottleMiddleware::disabled();
        }
    };

    // Forget idle clients so keyed state does not grow without bound.
    {
        let (anon, user) = (anon.clone(), user.clone());
        actix_rt::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                anon.prune();
                user.prune();
            }
        });
    }

    tracing::info!(
        anon_per_minute = config.anon_per_minute,
        user_per_minute = config.user_per_minute,
        "Throttling enabled"
    );
    ThrottleMiddleware::new(Throttle::new(anon, user, tokens))
}

#[cfg(not(feature = "rate-limit"))]
fn build_throttle(_config: ThrottleConfig, _tokens: Arc<dyn TokenService>) -> ThrottleMiddleware {
    tracing::info!("Built without the rate-limit feature; throttling disabled");
    ThrottleMiddleware::disabled()
}
