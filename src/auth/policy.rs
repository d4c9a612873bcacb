//! Route-level authorization, applied after the request gate.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{Error, HttpMessage, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use tracing::debug;

use crate::auth::gate::CallerIdentity;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
struct Rule {
    method: Option<Method>,
    pattern: &'static str,
}

impl Rule {
    fn any(pattern: &'static str) -> Self {
        Self { method: None, pattern }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(m) = &self.method {
            if m != method {
                return false;
            }
        }
        match self.pattern.strip_suffix("/**") {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .map_or(false, |rest| rest.starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

/// Which routes may be reached without a caller identity.
#[derive(Clone)]
pub struct AccessPolicy {
    public: Vec<Rule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            public: vec![
                Rule::any("/api/users/login"),
                Rule::any("/api/users/register"),
                Rule::any("/api/users/check-nickname"),
                Rule::any("/api/users/reissue"),
                Rule { method: Some(Method::GET), pattern: "/api/posts/**" },
                Rule { method: Some(Method::GET), pattern: "/health" },
            ],
        }
    }
}

impl AccessPolicy {
    pub fn requires_identity(&self, method: &Method, path: &str) -> bool {
        // Preflight requests never carry credentials.
        if method == Method::OPTIONS {
            return false;
        }
        !self.public.iter().any(|rule| rule.matches(method, path))
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessPolicy
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessPolicyMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessPolicyMiddleware {
            service,
            policy: self.clone(),
        }))
    }
}

pub struct AccessPolicyMiddleware<S> {
    service: S,
    policy: AccessPolicy,
}

impl<S, B> Service<ServiceRequest> for AccessPolicyMiddleware<S>
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
        let has_identity = req.extensions().get::<CallerIdentity>().is_some();

        if !has_identity && self.policy.requires_identity(req.method(), req.path()) {
            debug!(method = %req.method(), path = %req.path(), "rejecting unauthenticated request");
            let (request, _payload) = req.into_parts();
            let response = AppError::AuthError(AuthError::Unauthenticated)
                .error_response()
                .map_into_right_body();
            return Box::pin(ready(Ok(ServiceResponse::new(request, response))));
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
