//! HTTP handlers for the feed server.

use super::FeedState;
use crate::entity_actor::EntityError;
use crate::model::{Entity, EntityId, EntityReply, LifecycleEvent};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

const MONITOR_PAGE: &str = include_str!("assets/monitor.html");

pub async fn monitor_page() -> Html<&'static str> {
    Html(MONITOR_PAGE)
}

/// Current tree, same payload as a socket push.
pub async fn topology(State(state): State<FeedState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.view.to_json(),
    )
        .into_response()
}

pub async fn health(State(state): State<FeedState>) -> Json<serde_json::Value> {
    Json(json!({ "member": state.member, "status": "up" }))
}

/// Peer ingress. Whatever the sender claims, the event is applied here and never sent on.
pub async fn ingest_event(
    State(state): State<FeedState>,
    Json(event): Json<LifecycleEvent>,
) -> Response {
    debug!(
        origin = %event.origin_member,
        entity_id = %event.entity_id,
        kind = ?event.kind,
        "Event from peer"
    );
    match state.aggregator.notify(event.as_forwarded()) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

pub async fn send_command(
    State(state): State<FeedState>,
    Path(id): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Response {
    let entity = Entity::new(id, value);
    match state.entities.send_command(entity).await {
        Ok(EntityReply::CommandAck { kind, entity }) => {
            Json(json!({ "ack": kind, "entity": entity })).into_response()
        }
        Ok(other) => unexpected_reply(other),
        Err(e) => e.into_response(),
    }
}

pub async fn query_entity(State(state): State<FeedState>, Path(id): Path<String>) -> Response {
    match state.entities.query(EntityId::new(id)).await {
        Ok(EntityReply::QueryAck(entity_state)) => Json(entity_state).into_response(),
        Ok(EntityReply::QueryNotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found", "id": id })),
        )
            .into_response(),
        Ok(other) => unexpected_reply(other),
        Err(e) => e.into_response(),
    }
}

fn unexpected_reply(reply: EntityReply) -> Response {
    warn!(?reply, "Unexpected entity reply");
    (StatusCode::INTERNAL_SERVER_ERROR, "unexpected entity reply").into_response()
}

impl IntoResponse for EntityError {
    fn into_response(self) -> Response {
        let status = match self {
            EntityError::MalformedRoutingKey(_) => StatusCode::BAD_REQUEST,
            EntityError::MailboxFull(_) | EntityError::ActorCommunicationError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
