use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{debug, error, info};

use super::{
    models::{CompletionMessage, DownloadRequest, HealthResponse, StreamError, TaskCreatedResponse},
    state::AppState,
    validation::SubmissionValidationError,
};
use crate::api::error::ApiError;
use crate::tasks::{TaskEvent, TaskObserver};

/// Task submission endpoint (POST /api/download)
///
/// Registers a task for the submitted links, starts its executor in the
/// background and answers 202 with the task id without waiting for any
/// download. The shared-secret check runs in middleware before this handler.
pub async fn submit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    super::utils::parse_content_type(content_type)?;

    // Decompression happens in `RequestDecompressionLayer`, so the limit
    // applies to the decompressed bytes
    let body_bytes =
        super::utils::read_limited_body(body, state.config.server.max_payload_bytes).await?;

    let request: DownloadRequest = serde_json::from_slice(&body_bytes).map_err(|err| {
        debug!(error = %err, "Rejecting undecodable submission");
        ApiError::InvalidPayload("cannot decode request body".into())
    })?;
    super::validation::validate_submission(&request, state.config.server.max_links)
        .map_err(map_submission_error)?;

    let credential = super::utils::authorization_header(&headers).map(str::to_owned);
    let handle = state.registry.create(request.links, credential);
    let task_id = handle.id().to_string();
    let link_count = handle.links().len();

    state.executor.spawn(handle);
    state.metrics.task_accepted();
    info!(task_id = %task_id, links = link_count, "Task created");

    Ok((StatusCode::ACCEPTED, Json(TaskCreatedResponse { task_id })))
}

fn map_submission_error(err: SubmissionValidationError) -> ApiError {
    ApiError::InvalidPayload(err.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Credential for clients that cannot set headers (e.g. `EventSource`)
    pub token: Option<String>,
}

/// Task status stream (GET /api/download/status/{task_id})
///
/// Attaches an observer to a live task and streams its results as
/// Server-Sent Events, ending with a `complete` or `error` event.
pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<StatusQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if task_id.trim().is_empty() {
        return Err(missing_task_id().await);
    }

    let task = state
        .registry
        .lookup(&task_id)
        .ok_or_else(|| ApiError::NotFound("Task ID not found or already completed".into()))?;

    let presented = super::utils::authorization_header(&headers).or(query.token.as_deref());
    super::auth::authorize_observer(state.config.auth.password.as_deref(), &task, presented)?;

    let observer = task.observe();
    state.metrics.observer_attached();
    info!(task_id = %task_id, "SSE connection established");

    Ok(Sse::new(event_stream(observer))
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// Greeting comment followed by the observer's events
fn event_stream(
    observer: TaskObserver,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let task_id = observer.task_id().to_string();
    let greeting =
        Event::default().comment(format!("connection established for task {}", task_id));

    stream::once(async move { Ok::<_, Infallible>(greeting) }).chain(
        observer
            .into_stream()
            .map(move |event| Ok(to_sse_event(&task_id, event))),
    )
}

fn to_sse_event(task_id: &str, event: TaskEvent) -> Event {
    match event {
        TaskEvent::Result(result) => match serde_json::to_string(&result) {
            Ok(json) => {
                debug!(task_id, update = %json, "Sending update");
                Event::default().data(json)
            }
            Err(err) => {
                error!(task_id, error = %err, "Error marshalling update to JSON");
                error_event(format!("could not encode update for {}", result.link))
            }
        },
        TaskEvent::Complete => Event::default()
            .event("complete")
            .data(json_or_empty(&CompletionMessage::default())),
        TaskEvent::Error(message) => error_event(message),
    }
}

fn error_event(message: String) -> Event {
    Event::default()
        .event("error")
        .data(json_or_empty(&StreamError { error: message }))
}

fn json_or_empty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Status requests without a task id
pub async fn missing_task_id() -> ApiError {
    ApiError::InvalidPayload("Task ID missing in URL path".into())
}

pub async fn submit_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("only POST method allowed")
}

pub async fn status_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("only GET method allowed for status")
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_tasks: state.registry.len(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{CHANNEL_CLOSED_MESSAGE, TaskResult};

    /// Wire form of a single event as an SSE response body
    async fn render(event: Event) -> String {
        let response = Sse::new(stream::iter([Ok::<_, Infallible>(event)])).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_event_frame() {
        let frame = render(to_sse_event(
            "task-1",
            TaskEvent::Error(CHANNEL_CLOSED_MESSAGE.to_string()),
        ))
        .await;

        assert_eq!(
            frame.trim_end(),
            "event: error\ndata: {\"error\":\"Updates channel closed unexpectedly on server.\"}"
        );
    }

    #[tokio::test]
    async fn test_result_and_complete_frames() {
        let result = render(to_sse_event(
            "task-1",
            TaskEvent::Result(TaskResult::failure("b", "exit status: 1")),
        ))
        .await;
        assert_eq!(
            result.trim_end(),
            r#"data: {"link":"b","status":"fail","error":"exit status: 1"}"#
        );

        let complete = render(to_sse_event("task-1", TaskEvent::Complete)).await;
        assert_eq!(
            complete.trim_end(),
            "event: complete\ndata: {\"message\":\"Task completed\"}"
        );
    }

    #[test]
    fn test_completion_payload() {
        assert_eq!(
            json_or_empty(&CompletionMessage::default()),
            r#"{"message":"Task completed"}"#
        );
    }
}
