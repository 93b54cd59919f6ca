//! Shared-secret authorization
//!
//! When `auth.password` is configured, submissions must carry it verbatim in
//! the `Authorization` header, and status streams must present a credential
//! matching both the secret and the one the task was submitted with. Without
//! a configured secret every request passes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::utils::{authorization_header, constant_time_eq};
use crate::tasks::Task;

/// Middleware guarding the submit route
pub async fn require_credential(
    State(secret): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(secret) = secret else {
        return next.run(request).await;
    };

    match authorization_header(request.headers()) {
        Some(presented) if constant_time_eq(presented, &secret) => next.run(request).await,
        _ => ApiError::Unauthorized("Unauthorized").into_response(),
    }
}

/// Re-authorize an observer against the credential stored on the task
pub fn authorize_observer(
    secret: Option<&str>,
    task: &Task,
    presented: Option<&str>,
) -> Result<(), ApiError> {
    let Some(secret) = secret else {
        return Ok(());
    };

    let authorized = presented.is_some_and(|presented| {
        let matches_secret = constant_time_eq(presented, secret);
        let matches_task = task
            .credential()
            .is_some_and(|stored| constant_time_eq(stored, presented));
        matches_secret && matches_task
    });

    if authorized {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("Unauthorized for task status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskRegistry;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn ok_handler() -> impl IntoResponse {
        (StatusCode::OK, "Success")
    }

    fn guarded(secret: Option<&str>) -> Router {
        Router::new()
            .route("/", get(ok_handler))
            .layer(middleware::from_fn_with_state(
                secret.map(str::to_owned),
                require_credential,
            ))
    }

    fn request(credential: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(credential) = credential {
            builder = builder.header(header::AUTHORIZATION, credential);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_open_mode_allows_everything() {
        let response = guarded(None).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_matching_credential() {
        let response = guarded(Some("secret"))
            .oneshot(request(Some("secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_or_missing_credential() {
        let response = guarded(Some("secret"))
            .oneshot(request(Some("guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = guarded(Some("secret")).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_authorize_observer() {
        let registry = TaskRegistry::new();
        let handle = registry.create(vec!["a".to_string()], Some("secret".to_string()));
        let task = registry.lookup(handle.id()).unwrap();

        assert!(authorize_observer(None, &task, None).is_ok());
        assert!(authorize_observer(Some("secret"), &task, Some("secret")).is_ok());
        assert!(authorize_observer(Some("secret"), &task, Some("wrong")).is_err());
        assert!(authorize_observer(Some("secret"), &task, None).is_err());
    }

    #[test]
    fn test_authorize_observer_rejects_task_without_credential() {
        let registry = TaskRegistry::new();
        let handle = registry.create(vec!["a".to_string()], None);
        let task = registry.lookup(handle.id()).unwrap();

        assert!(authorize_observer(Some("secret"), &task, Some("secret")).is_err());
    }
}
