//! Asynchronous producer route.
//!
//! Reads the whole request body, enqueues it on a topic and acknowledges
//! immediately. The request is not held open for downstream processing.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::handlers::{RequestContext, RouteHandler};
use crate::observability::metrics;
use crate::queue::{MessageSink, ProducerError, QueuedMessage};

pub const ACK_BODY: &str = "Message produced successfully";

#[derive(Debug, Clone)]
pub struct QueueProducer {
    topic: String,
    sink: Arc<dyn MessageSink>,
    max_body_size: usize,
}

impl QueueProducer {
    pub fn new(topic: impl Into<String>, sink: Arc<dyn MessageSink>, max_body_size: usize) -> Self {
        Self {
            topic: topic.into(),
            sink,
            max_body_size,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl RouteHandler for QueueProducer {
    async fn handle(&self, ctx: RequestContext, request: Request<Body>) -> Response {
        let payload = match axum::body::to_bytes(request.into_body(), self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %ctx.request_id, error = %e, "Failed to read request body");
                return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
            }
        };

        let message = QueuedMessage {
            topic: self.topic.clone(),
            payload,
            request_id: ctx.request_id.clone(),
            sender: ctx.identity,
        };

        match self.sink.enqueue(message) {
            Ok(()) => {
                metrics::record_enqueued(&self.topic);
                (StatusCode::OK, ACK_BODY).into_response()
            }
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    topic = %self.topic,
                    error = %e,
                    "Failed to enqueue message"
                );
                let body = match e {
                    ProducerError::Full => "Message queue is full",
                    ProducerError::Closed => "Message queue unavailable",
                };
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "producer"
    }
}
