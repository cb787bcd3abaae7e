//! Fixed-window request limiter keyed by client IP, applied to the whole
//! app. Windows live in a shared map so every worker counts against the
//! same budget.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use dashmap::DashMap;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Clone)]
pub struct RateLimit {
    windows: Arc<DashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> RateLimit {
        RateLimit {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    /// Count one request against `peer`'s current window, opening a fresh
    /// window when the old one has elapsed.
    fn admit(&self, peer: String) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(peer).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= self.max_requests
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let peer = {
            let info = req.connection_info();
            info.realip_remote_addr().unwrap_or("unknown").to_string()
        };

        if self.limit.admit(peer) {
            let fut = self.service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        } else {
            let response = HttpResponse::TooManyRequests()
                .insert_header(("Content-Type", "text/plain"))
                .body(LIMIT_MESSAGE);
            Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_admits_up_to_the_limit() {
        let limit = RateLimit::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limit.admit("10.0.0.1".to_string()));
        }
        assert!(!limit.admit("10.0.0.1".to_string()));

        // Another peer has its own budget.
        assert!(limit.admit("10.0.0.2".to_string()));
    }

    #[test]
    fn elapsed_window_resets_the_count() {
        let limit = RateLimit::new(1, Duration::ZERO);

        assert!(limit.admit("10.0.0.1".to_string()));
        // A zero-length window has always elapsed, so every request opens
        // a fresh one.
        assert!(limit.admit("10.0.0.1".to_string()));
    }
}
