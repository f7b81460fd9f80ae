use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use camlink_core::{PublishError, Publisher};
use camlink_gateway::build_router;

// -- Mock publisher --

struct MockPublisher {
    topic: String,
    attempts: Mutex<Vec<Vec<u8>>>,
    fail: bool,
}

impl MockPublisher {
    fn new(topic: &str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            topic: topic.to_string(),
            attempts: Mutex::new(Vec::new()),
            fail,
        })
    }
}

impl Publisher for MockPublisher {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        self.attempts.lock().unwrap().push(payload.to_vec());
        if self.fail {
            return Err(PublishError::NotConnected);
        }
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

fn webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn alarm_flows_from_webhook_to_publisher() {
    let publisher = MockPublisher::new("home/alarms/side-gate", false);
    let app = build_router(Arc::clone(&publisher), 1_048_576);

    let nested = r#"{"alarm": {"type": "motion", "channel": 2, "detail": {"zone": ["yard", 3]}}}"#;
    let resp = app.oneshot(webhook_request(nested)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = response_json(resp).await;
    assert_eq!(json["status"], "success");
    assert_eq!(
        json["message"],
        "Published to MQTT topic: home/alarms/side-gate"
    );

    // The published bytes round-trip to a value deep-equal to the original
    // alarm field.
    let attempts = publisher.attempts.lock().unwrap();
    assert_eq!(attempts.len(), 1);
    let republished: serde_json::Value = serde_json::from_slice(&attempts[0]).unwrap();
    assert_eq!(
        republished,
        serde_json::json!({"type": "motion", "channel": 2, "detail": {"zone": ["yard", 3]}})
    );
}

#[tokio::test]
async fn broker_outage_surfaces_as_500_per_request() {
    let publisher = MockPublisher::new("home/alarms/camera", true);
    let app = build_router(Arc::clone(&publisher), 1_048_576);

    let resp = app
        .oneshot(webhook_request(r#"{"alarm": {"type": "motion"}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = response_json(resp).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Failed to publish to MQTT");
    // The attempt was made; the failure is per-request, no retry.
    assert_eq!(publisher.attempts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_requests_never_reach_the_publisher() {
    let publisher = MockPublisher::new("home/alarms/camera", false);
    let app = build_router(Arc::clone(&publisher), 1_048_576);

    let plain = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "text/plain")
        .body(Body::from("alarm"))
        .unwrap();
    let resp = app.clone().oneshot(plain).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let resp = app
        .oneshot(webhook_request(r#"{"foo": 1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(publisher.attempts.lock().unwrap().is_empty());
}
