use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, HttpRequest, HttpResponse, ResponseError,
};
use dashmap::DashMap;
use futures::future::{ready, LocalBoxFuture, Ready};
use serde::Deserialize;
use std::net::IpAddr;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
    /// Reverse proxies allowed to report the client through `X-Forwarded-For`.
    /// Empty means the socket peer is always the client.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 900, // 15 minutes
            trusted_proxies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request against its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// In-process fixed-window counter keyed by client address.
///
/// Shared across actix workers behind an `Arc`.
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window_len(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let window_len = self.window_len();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= window_len {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.config.max_requests {
            let elapsed = now.duration_since(entry.started);
            return Decision::Limited {
                retry_after: window_len.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        Decision::Allowed {
            remaining: self.config.max_requests - entry.count,
        }
    }

    /// Drop windows that have already closed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let window_len = self.window_len();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window_len);
        before - self.windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Too many requests from this IP, please try again later.")]
pub struct RateLimitExceeded {
    retry_after: Duration,
}

impl ResponseError for RateLimitExceeded {
    fn status_code(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    fn error_response(&self) -> HttpResponse {
        // Round up so clients never retry a moment too early.
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        HttpResponse::build(self.status_code())
            .insert_header((header::RETRY_AFTER, secs.to_string()))
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

/// Client address as seen through `trusted_proxies`.
///
/// The socket peer is the client unless it is a trusted proxy. Only then is
/// `X-Forwarded-For` read, right to left, skipping further trusted hops; the
/// first untrusted entry is the client. Entries left of it are caller-supplied
/// and never used.
pub fn client_ip(req: &HttpRequest, trusted_proxies: &[IpAddr]) -> Option<IpAddr> {
    let peer = req.peer_addr().map(|addr| addr.ip())?;
    if !trusted_proxies.contains(&peer) {
        return Some(peer);
    }

    let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
    else {
        return Some(peer);
    };

    let mut client = peer;
    for hop in forwarded.rsplit(',') {
        match hop.trim().parse::<IpAddr>() {
            Ok(ip) => {
                client = ip;
                if !trusted_proxies.contains(&ip) {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    Some(client)
}

pub struct RateLimitMiddleware {
    limiter: Arc<FixedWindowLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<FixedWindowLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<FixedWindowLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let key = client_ip(req.request(), &self.limiter.config().trusted_proxies)
            .map(|ip| format!("ip:{ip}"))
            .unwrap_or_else(|| "ip:unknown".to_string());
        let decision = self.limiter.check(&key);

        Box::pin(async move {
            if let Decision::Limited { retry_after } = decision {
                tracing::warn!(
                    client = %key,
                    path = %req.path(),
                    retry_after_secs = retry_after.as_secs(),
                    "Rate limit exceeded"
                );
                return Err(RateLimitExceeded { retry_after }.into());
            }

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    fn limiter(max_requests: u32, window_seconds: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests,
            window_seconds,
            ..Default::default()
        })
    }

    #[::core::prelude::v1::test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_seconds, 900);
    }

    #[::core::prelude::v1::test]
    fn test_limits_after_cap_within_window() {
        let limiter = limiter(2, 60);
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at("a", now), Decision::Allowed { remaining: 0 });
        assert!(matches!(
            limiter.check_at("a", now + Duration::from_secs(10)),
            Decision::Limited { retry_after } if retry_after == Duration::from_secs(50)
        ));
    }

    #[::core::prelude::v1::test]
    fn test_keys_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("b", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited { .. }));
    }

    #[::core::prelude::v1::test]
    fn test_window_resets() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), Decision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited { .. }));
        assert!(matches!(
            limiter.check_at("a", now + Duration::from_secs(60)),
            Decision::Allowed { .. }
        ));
    }

    #[::core::prelude::v1::test]
    fn test_purge_expired() {
        let limiter = limiter(5, 60);
        let now = Instant::now();
        limiter.check_at("old", now);
        limiter.check_at("new", now + Duration::from_secs(30));

        assert_eq!(limiter.purge_expired_at(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_middleware_returns_429_json() {
        let limiter = Arc::new(limiter(1, 60));
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter))
                .route("/", web::get().to(ok)),
        )
        .await;

        let req = || {
            test::TestRequest::get()
                .uri("/")
                .peer_addr("203.0.113.7:5100".parse().unwrap())
                .to_request()
        };

        let resp = test::call_service(&app, req()).await;
        assert!(resp.status().is_success());

        let err = match test::try_call_service(&app, req()).await {
            Ok(_) => panic!("second request should be limited"),
            Err(e) => e,
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(header::RETRY_AFTER));
    }

    #[actix_web::test]
    async fn test_rotating_forwarded_for_does_not_reset_limit() {
        let limiter = Arc::new(limiter(1, 60));
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter.clone()))
                .route("/", web::get().to(ok)),
        )
        .await;

        let mut allowed = 0;
        for i in 0..50 {
            let req = test::TestRequest::get()
                .uri("/")
                .peer_addr("198.51.100.9:6000".parse().unwrap())
                .insert_header(("X-Forwarded-For", format!("10.0.0.{i}")))
                .to_request();
            if test::try_call_service(&app, req).await.is_ok() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[::core::prelude::v1::test]
    fn test_client_ip_ignores_forwarded_for_from_untrusted_peer() {
        let req = test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "198.51.100.2"))
            .peer_addr("203.0.113.50:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req, &[]), Some("203.0.113.50".parse().unwrap()));

        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(client_ip(&req, &[proxy]), Some("203.0.113.50".parse().unwrap()));
    }

    #[::core::prelude::v1::test]
    fn test_client_ip_behind_trusted_proxies() {
        let proxies: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];

        // Leftmost entry is whatever the caller sent; the proxy appended the real address.
        let req = test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "1.2.3.4, 198.51.100.2, 10.0.0.2"))
            .peer_addr("10.0.0.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req, &proxies), Some("198.51.100.2".parse().unwrap()));

        let req = test::TestRequest::default()
            .peer_addr("10.0.0.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req, &proxies), Some("10.0.0.1".parse().unwrap()));

        let req = test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "not-an-ip"))
            .peer_addr("10.0.0.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req, &proxies), Some("10.0.0.1".parse().unwrap()));
    }
}
