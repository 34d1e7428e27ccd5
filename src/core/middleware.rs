use crate::core::error::AppError;
use crate::features::auth::JwtValidator;
use crate::features::users::UserDirectory;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Tracing span carrying method, uri and the request id
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Decode a `Basic` authorization header into `user:pass`
fn basic_credentials(auth_header: &str) -> Option<String> {
    let encoded = auth_header.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded).ok()?;
    String::from_utf8(decoded).ok()
}

/// Basic auth gate for the Swagger UI
pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(basic_credentials)
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// Shared state for the bearer middleware
pub struct AuthState {
    pub validator: JwtValidator,
    pub users: Arc<dyn UserDirectory>,
}

/// Resolve the bearer token into an `AuthenticatedUser` request extension and
/// mirror the caller into the local user directory
pub async fn auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let user = auth.validator.validate_token(token)?;
    auth.users.sync_identity(&user).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::features::auth::model::Role;
    use crate::features::notifications::{DriverNotice, NotificationDispatcher};
    use crate::shared::test_helpers::{bearer_token, InMemoryStore};
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use axum_test::TestServer;
    use std::time::Duration;

    const SECRET: &str = "middleware-secret";

    fn protected(store: Arc<InMemoryStore>) -> TestServer {
        let auth = Arc::new(AuthState {
            validator: JwtValidator::new(SECRET, None, Duration::from_secs(0)),
            users: store,
        });
        let app = Router::new()
            .route("/api/ping", get(|| async { StatusCode::OK }))
            .route_layer(from_fn_with_state(auth, auth_middleware));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_first_request_mirrors_new_driver() {
        let store = Arc::new(InMemoryStore::new());
        let server = protected(store.clone());
        let driver_id = Uuid::new_v4();

        server
            .get("/api/ping")
            .authorization_bearer(bearer_token(SECRET, driver_id, "driver"))
            .await
            .assert_status_ok();

        assert_eq!(store.snapshot().users.get(&driver_id), Some(&Role::Driver));

        let notice = DriverNotice::new_recovery(Uuid::new_v4(), "Gala", "Hall", None);
        let reached = store.notify_active_drivers(notice).await.unwrap();
        assert_eq!(reached, 1);
    }

    #[tokio::test]
    async fn test_role_change_is_mirrored() {
        let store = Arc::new(InMemoryStore::new());
        let server = protected(store.clone());
        let user_id = Uuid::new_v4();

        for role in ["reporter", "driver"] {
            server
                .get("/api/ping")
                .authorization_bearer(bearer_token(SECRET, user_id, role))
                .await
                .assert_status_ok();
        }

        let users = store.snapshot().users;
        assert_eq!(users.len(), 1);
        assert_eq!(users.get(&user_id), Some(&Role::Driver));
    }

    #[tokio::test]
    async fn test_rejected_token_is_not_mirrored() {
        let store = Arc::new(InMemoryStore::new());
        let server = protected(store.clone());

        server
            .get("/api/ping")
            .authorization_bearer(bearer_token("wrong-secret", Uuid::new_v4(), "driver"))
            .expect_failure()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        assert!(store.snapshot().users.is_empty());
    }

    #[test]
    fn test_basic_credentials_decodes_header() {
        let header = format!("Basic {}", BASE64_STANDARD.encode("admin:secret"));
        assert_eq!(basic_credentials(&header).as_deref(), Some("admin:secret"));
    }

    #[test]
    fn test_basic_credentials_rejects_other_schemes() {
        assert_eq!(basic_credentials("Bearer abc"), None);
        assert_eq!(basic_credentials("Basic !!not-base64!!"), None);
    }
}
