use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use camlink_core::Publisher;

use crate::server::AppState;

const ERR_NOT_JSON: &str = "Unsupported Media Type: must be application/json";
const ERR_NO_ALARM: &str = "Bad Request: JSON body must contain an 'alarm' object";

#[derive(serde::Serialize)]
struct ValidationError {
    error: &'static str,
}

#[derive(serde::Serialize)]
struct PublishOutcome {
    status: &'static str,
    message: String,
}

/// Validate an inbound webhook and forward its alarm payload.
///
/// The `alarm` value is forwarded verbatim: re-serialized from the exact
/// structure found in the request, never inspected further.
pub(crate) async fn webhook_handler<P: Publisher>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    tracing::debug!("received webhook request");

    if !declares_json(&headers) {
        tracing::warn!("rejecting request without JSON content type");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ValidationError {
                error: ERR_NOT_JSON,
            }),
        )
            .into_response();
    }

    let alarm = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(data) => data.get("alarm").cloned(),
        Err(e) => {
            tracing::warn!(error = %e, "request body is not valid JSON");
            None
        }
    };
    let Some(alarm) = alarm else {
        tracing::warn!("missing 'alarm' key in JSON body");
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidationError {
                error: ERR_NO_ALARM,
            }),
        )
            .into_response();
    };

    // Serializing a Value parsed from JSON cannot produce non-string map
    // keys, so this only fails on I/O, which Vec does not do.
    let payload = match serde_json::to_vec(&alarm) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize alarm payload");
            return publish_failed();
        }
    };

    let topic = state.publisher.topic();
    match state.publisher.publish(&payload).await {
        Ok(()) => {
            tracing::debug!(topic, "published alarm payload");
            (
                StatusCode::OK,
                Json(PublishOutcome {
                    status: "success",
                    message: format!("Published to MQTT topic: {topic}"),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, topic, "failed to publish alarm payload");
            publish_failed()
        }
    }
}

fn publish_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(PublishOutcome {
            status: "error",
            message: "Failed to publish to MQTT".into(),
        }),
    )
        .into_response()
}

/// Whether the content type declares a JSON body. Parameters such as
/// `charset` are ignored; `+json` suffixes are accepted.
fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| {
            let media = media.trim();
            media.eq_ignore_ascii_case("application/json")
                || media.to_ascii_lowercase().ends_with("+json")
        })
}
