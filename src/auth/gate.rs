//! Request gate: turns a bearer token into a request-scoped caller identity.
//!
//! The gate never rejects a request. A missing, malformed or expired token
//! just leaves the request without an identity; `AccessPolicy` and the
//! `Authenticated` extractor decide whether that is acceptable for the route.

use std::sync::Arc;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use tracing::debug;

use crate::auth::token::TokenCodec;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

/// Routes the gate forwards without looking at any token.
pub const GATE_EXEMPT_PATHS: [&str; 4] = [
    "/api/users/login",
    "/api/users/register",
    "/api/users/check-nickname",
    "/api/users/reissue",
];

/// The authenticated principal of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub email: String,
}

pub fn is_gate_exempt(path: &str) -> bool {
    GATE_EXEMPT_PATHS.contains(&path)
}

/// Token after `Bearer `, or an empty string when the header is absent,
/// not valid UTF-8, or uses another scheme.
pub fn bearer_token(req: &ServiceRequest) -> String {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .unwrap_or_default()
        .to_string()
}

pub struct RequestGate {
    codec: Arc<TokenCodec>,
}

impl RequestGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestGateMiddleware {
            service,
            codec: self.codec.clone(),
        }))
    }
}

pub struct RequestGateMiddleware<S> {
    service: S,
    codec: Arc<TokenCodec>,
}

impl<S> RequestGateMiddleware<S> {
    fn authenticate(&self, req: &ServiceRequest) {
        if is_gate_exempt(req.path()) {
            return;
        }

        let token = bearer_token(req);
        if !token.is_empty() && self.codec.validate(&token) {
            match self.codec.extract_subject(&token) {
                Ok(email) => {
                    req.extensions_mut().insert(CallerIdentity { email });
                    return;
                }
                Err(e) => debug!(error = %e, "validated token has no readable subject"),
            }
        }

        req.extensions_mut().remove::<CallerIdentity>();
    }
}

impl<S, B> Service<ServiceRequest> for RequestGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        self.authenticate(&req);
        self.service.call(req)
    }
}

/// Extractor for handlers that need a caller. Rejects with 401 when the gate
/// did not establish an identity.
#[derive(Debug, Clone)]
pub struct Authenticated(pub CallerIdentity);

impl Authenticated {
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequest for Authenticated {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CallerIdentity>()
                .cloned()
                .map(Authenticated)
                .ok_or(AppError::AuthError(AuthError::Unauthenticated)),
        )
    }
}
