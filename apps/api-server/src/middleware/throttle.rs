//! Request throttling middleware.
//!
//! Anonymous clients are limited per IP address, authenticated users per user
//! id, each against its own limiter.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use adboard_core::ports::{RateLimiter, TokenService};
use adboard_shared::ErrorResponse;

use super::auth::authenticate;

/// The two limiters and what is needed to tell their callers apart.
pub struct Throttle {
    anon: Arc<dyn RateLimiter>,
    user: Arc<dyn RateLimiter>,
    tokens: Arc<dyn TokenService>,
}

impl Throttle {
    pub fn new(
        anon: Arc<dyn RateLimiter>,
        user: Arc<dyn RateLimiter>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self { anon, user, tokens }
    }

    /// Pick the limiter and key for a request. A bad token counts as anonymous
    /// here; the handler reports the authentication failure itself.
    ///
    /// Anonymous clients are keyed by the socket peer. Forwarding headers are
    /// client-controlled and ignored.
    fn classify(&self, req: &ServiceRequest) -> (&dyn RateLimiter, String) {
        match authenticate(req.request(), self.tokens.as_ref()) {
            Ok(Some(identity)) => (self.user.as_ref(), format!("user:{}", identity.user_id)),
            _ => {
                let ip = req
                    .peer_addr()
                    .map(|addr| addr.ip().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                (self.anon.as_ref(), format!("anon:{ip}"))
            }
        }
    }
}

/// Throttling middleware factory. `disabled()` passes every request through.
#[derive(Clone)]
pub struct ThrottleMiddleware {
    throttle: Option<Arc<Throttle>>,
}

impl ThrottleMiddleware {
    pub fn new(throttle: Throttle) -> Self {
        Self {
            throttle: Some(Arc::new(throttle)),
        }
    }

    pub fn disabled() -> Self {
        Self { throttle: None }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ThrottleMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ThrottleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ThrottleService {
            service: Rc::new(service),
            throttle: self.throttle.clone(),
        }))
    }
}

pub struct ThrottleService<S> {
    service: Rc<S>,
    throttle: Option<Arc<Throttle>>,
}

impl<S, B> Service<ServiceRequest> for ThrottleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let throttle = self.throttle.clone();

        Box::pin(async move {
            if let Some(throttle) = throttle {
                let (limiter, key) = throttle.classify(&req);

                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        let retry_after = result.reset_after.as_secs().max(1);
                        tracing::warn!(key = %key, retry_after, "Rate limit exceeded");

                        let response = HttpResponse::TooManyRequests()
                            .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                            .json(ErrorResponse::too_many_requests(format!(
                                "Request was throttled. Expected available in {retry_after} seconds."
                            )));

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Fail open.
                        tracing::error!(error = %e, "Rate limiter error, letting request through");
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use adboard_core::ports::{RateLimitError, RateLimitResult};
    use adboard_infra::{JwtConfig, JwtTokenService};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the keys it sees and answers with a fixed decision.
    struct FixedLimiter {
        decision: Option<bool>,
        seen: Mutex<Vec<String>>,
    }

    impl FixedLimiter {
        fn new(decision: Option<bool>) -> Arc<Self> {
            Arc::new(Self {
                decision,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateLimiter for FixedLimiter {
        async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
            self.seen.lock().unwrap().push(key.to_string());
            match self.decision {
                Some(allowed) => Ok(RateLimitResult {
                    allowed,
                    reset_after: Duration::from_secs(if allowed { 0 } else { 5 }),
                }),
                None => Err(RateLimitError::Backend("unavailable".to_string())),
            }
        }
    }

    fn tokens() -> Arc<dyn TokenService> {
        Arc::new(JwtTokenService::new(JwtConfig::default()))
    }

    macro_rules! throttled_app {
        ($anon:expr, $user:expr, $tokens:expr) => {
            test::init_service(
                App::new()
                    .wrap(ThrottleMiddleware::new(Throttle::new(
                        $anon.clone(),
                        $user.clone(),
                        $tokens.clone(),
                    )))
                    .route("/", web::get().to(|| async { "ok" })),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_rejected_request_gets_retry_after() {
        let anon = FixedLimiter::new(Some(false));
        let user = FixedLimiter::new(Some(true));
        let app = throttled_app!(anon, user, tokens());

        let req = test::TestRequest::get()
            .uri("/")
            .peer_addr("10.1.2.3:4000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "5");
        assert_eq!(anon.seen(), vec!["anon:10.1.2.3".to_string()]);
        assert!(user.seen().is_empty());
    }

    #[actix_web::test]
    async fn test_forwarded_headers_do_not_change_the_anonymous_key() {
        let anon = FixedLimiter::new(Some(true));
        let user = FixedLimiter::new(Some(true));
        let app = throttled_app!(anon, user, tokens());

        for spoofed in ["1.2.3.4", "5.6.7.8"] {
            let req = test::TestRequest::get()
                .uri("/")
                .peer_addr("10.1.2.3:4000".parse().unwrap())
                .insert_header(("X-Forwarded-For", spoofed))
                .insert_header((header::FORWARDED, format!("for={spoofed}")))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(
            anon.seen(),
            vec!["anon:10.1.2.3".to_string(), "anon:10.1.2.3".to_string()]
        );
    }

    #[actix_web::test]
    async fn test_authenticated_requests_use_the_user_budget() {
        let anon = FixedLimiter::new(Some(false));
        let user = FixedLimiter::new(Some(true));
        let tokens = tokens();
        let user_id = uuid::Uuid::new_v4();
        let token = tokens.generate_token(user_id, "u@example.com").unwrap();
        let app = throttled_app!(anon, user, tokens);

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(user.seen(), vec![format!("user:{user_id}")]);
        assert!(anon.seen().is_empty());
    }

    #[actix_web::test]
    async fn test_limiter_failure_lets_request_through() {
        let anon = FixedLimiter::new(None);
        let user = FixedLimiter::new(None);
        let app = throttled_app!(anon, user, tokens());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
