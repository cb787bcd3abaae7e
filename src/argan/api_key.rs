//! Shared-secret guard for the non-public API group. Clients present the
//! key in `x-api-key` (or `authorization`); anything else gets a 401.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct RequireApiKey {
    key: Arc<str>,
}

impl RequireApiKey {
    pub fn new(key: &str) -> RequireApiKey {
        RequireApiKey { key: key.into() }
    }
}

fn presented_key<'a>(req: &'a ServiceRequest) -> Option<&'a str> {
    req.headers()
        .get("x-api-key")
        .or_else(|| req.headers().get("authorization"))
        .and_then(|value| value.to_str().ok())
}

impl<S, B> Transform<S, ServiceRequest> for RequireApiKey
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireApiKeyMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireApiKeyMiddleware {
            service,
            key: Arc::clone(&self.key),
        }))
    }
}

pub struct RequireApiKeyMiddleware<S> {
    service: S,
    key: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for RequireApiKeyMiddleware<S>
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
        if presented_key(&req) == Some(self.key.as_ref()) {
            let fut = self.service.call(req);
            Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            })
        } else {
            let response = HttpResponse::Unauthorized()
                .json(json!({"error": "Unauthorized - Invalid API key"}));
            Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
        }
    }
}
