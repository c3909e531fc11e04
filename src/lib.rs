//! Server library - espone i moduli principali per i test

pub mod analysis;
pub mod conversations;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod storage;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Margine per i campi testuali e i boundary del multipart oltre al file
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(services::health_check))
        .nest("/auth", configure_auth_routes(state.clone()))
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/rooms", configure_room_routes(state.clone()))
        .nest("/messages", configure_message_routes(state.clone()))
        .nest("/faculty-messaging", configure_faculty_routes(state.clone()))
        .merge(configure_misc_routes(state.clone()));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configura le routes di autenticazione, tutte soggette a rate limiting
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, rate_limit_middleware};
    use services::*;

    let session_routes = Router::new()
        .route("/me", get(me))
        .route("/onboarding", post(onboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(session_routes)
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}

/// Configura le routes per la gestione degli utenti
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/search", get(search_users))
        .route("/friends", get(list_friends))
        .route("/friend-requests", get(list_friend_requests))
        .route("/friend-request/{id}", post(send_friend_request))
        .route("/friend-request/{id}/accept", put(accept_friend_request))
        .route("/friend-request/{id}/reject", put(reject_friend_request))
        .route("/children", get(list_children).post(link_child))
        .route("/child-conversations/{id}", get(get_child_conversations))
        .route("/{id}", get(get_user_by_id))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per la gestione delle stanze
fn configure_room_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, room_membership_middleware};
    use services::*;

    // Rotte che NON richiedono membership (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/bulk-delete", delete(bulk_delete_rooms))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono membership (autenticazione + membership middleware)
    let member_routes = Router::new()
        .route("/{room_id}", get(get_room).delete(delete_room))
        .route("/{room_id}/members", post(add_members))
        .route("/{room_id}/members/{user_id}", delete(remove_member))
        .route("/{room_id}/leave", post(leave_room))
        .route(
            "/{room_id}/messages",
            get(get_room_messages).post(post_room_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            room_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

/// Configura le routes per i messaggi diretti
fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route(
            "/direct/{user_id}",
            get(get_direct_messages).post(send_direct_message),
        )
        .route("/conversations", get(list_direct_conversations))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes riservate ai docenti
fn configure_faculty_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/send-message", post(send_message))
        .route(
            "/send-file",
            post(send_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Allegati, analisi delle chat e token per il client di chat
fn configure_misc_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/attachments/{id}", get(download_attachment))
        .route("/ai/analyze-chat", post(analyze_chat))
        .route("/chat/token", get(get_stream_token))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Avvia il task che ripulisce periodicamente token revocati scaduti e finestre di rate limiting
pub fn spawn_cleanup_task(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // Salta il primo tick che avviene immediatamente
        interval.tick().await;
        loop {
            interval.tick().await;
            state.blacklist.purge_expired();
            state.rate_limiter.purge_expired();
            debug!(
                "Cleanup done: {} revoked tokens, {} rate-limited clients tracked",
                state.blacklist.len(),
                state.rate_limiter.tracked_clients()
            );
        }
    })
}
