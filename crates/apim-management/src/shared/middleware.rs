//! API Middleware
//!
//! Callers identify themselves with headers; the gateway in front of this
//! service authenticates them. [`CallerLayer`] makes the tenancy defaults
//! available to the [`Caller`] extractor.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tower::{Layer, Service};

use crate::shared::api_common::ApiError;
use crate::usecase::ExecutionContext;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";
pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Values used when a request does not carry them.
#[derive(Debug, Clone)]
pub struct CallerDefaults {
    pub organization_id: String,
}

/// Identity of the caller of a management endpoint.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principal_id: String,
    pub organization_id: String,
    pub correlation_id: Option<String>,
}

impl Caller {
    /// Execution context for an operation in `environment_id`.
    pub fn context(&self, environment_id: &str) -> ExecutionContext {
        let ctx = ExecutionContext::create(&self.principal_id, &self.organization_id, environment_id);
        match &self.correlation_id {
            Some(correlation_id) => ctx.with_correlation(correlation_id),
            None => ctx,
        }
    }
}

pub struct CallerRejection {
    status: StatusCode,
    message: String,
}

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        let body = ApiError {
            error: "UNAUTHORIZED".to_string(),
            message: self.message,
            details: None,
        };
        (self.status, Json(body)).into_response()
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal_id = header(parts, PRINCIPAL_HEADER).ok_or_else(|| CallerRejection {
            status: StatusCode::UNAUTHORIZED,
            message: "Missing X-Principal-Id header".to_string(),
        })?;

        let organization_id = match header(parts, ORGANIZATION_HEADER) {
            Some(organization_id) => organization_id,
            None => parts
                .extensions
                .get::<CallerDefaults>()
                .map(|d| d.organization_id.clone())
                .ok_or_else(|| CallerRejection {
                    status: StatusCode::BAD_REQUEST,
                    message: "Missing X-Organization-Id header".to_string(),
                })?,
        };

        Ok(Caller {
            principal_id,
            organization_id,
            correlation_id: header(parts, CORRELATION_HEADER),
        })
    }
}

/// Middleware layer that injects [`CallerDefaults`] into request extensions.
#[derive(Clone)]
pub struct CallerLayer {
    defaults: CallerDefaults,
}

impl CallerLayer {
    pub fn new(defaults: CallerDefaults) -> Self {
        Self { defaults }
    }
}

impl<S> Layer<S> for CallerLayer {
    type Service = CallerMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CallerMiddleware {
            inner,
            defaults: self.defaults.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CallerMiddleware<S> {
    inner: S,
    defaults: CallerDefaults,
}

impl<S, B> Service<axum::http::Request<B>> for CallerMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.defaults.clone());
        let future = self.inner.call(req);
        Box::pin(future)
    }
}
