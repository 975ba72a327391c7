//! Messaging route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(inbox).post(send_message))
        .route("/api/messages/sent", get(sent_messages))
        .route("/api/messages/unread-count", get(unread_count))
        .route("/api/messages/contacts", get(contacts))
        .route(
            "/api/messages/:id",
            get(get_message).delete(delete_message),
        )
        .route("/api/messages/:id/read", post(mark_as_read))
}
