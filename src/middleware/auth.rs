/// Authentication middleware
///
/// Runs the authenticator on every protected request before any handler
/// logic: extracts the bearer token from the Authorization header,
/// resolves it to a subject, and injects the subject into request
/// extensions. Absent and invalid credentials get the same generic 401
/// body; the distinction lives only in the logs.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::session::SessionManager;

/// Pull the token out of an `Authorization` header value. The scheme is
/// matched case-insensitively, so `bearer <token>` works too.
fn extract_bearer(header: &str) -> Option<&str> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token)
    } else {
        None
    }
}

/// The resolved identity of the request, available to handlers via
/// `web::ReqData<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

/// Middleware for protecting routes.
///
/// Must be applied to every route scope that requires authentication.
pub struct AuthMiddleware {
    session: SessionManager,
}

impl AuthMiddleware {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            session: self.session.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    session: SessionManager,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer)
            .map(str::to_string);

        match self.session.authenticate(bearer.as_deref()) {
            Ok(subject) => {
                req.extensions_mut().insert(AuthenticatedUser { id: subject });

                tracing::debug!(subject = %subject, "Request authenticated");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(_) => {
                // One body for every failure mode; the authenticator has
                // already logged the reason.
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Not authenticated",
                    "code": "UNAUTHENTICATED"
                }));
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "Not authenticated",
                        response,
                    )
                    .into())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_accepts_any_scheme_case() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("BEARER abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_rejects_other_shapes() {
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer("abc.def.ghi"), None);
        assert_eq!(extract_bearer(""), None);
    }
}
