#![allow(dead_code)]

use axum_test::TestServer;
use server::config::Config;
use server::core::{AppState, encode_jwt};
use server::dtos::{CreateFriendRequestDTO, CreateRoomDTO, CreateUserDTO};
use server::entities::{FriendRequestStatus, Room, User, UserRole};
use server::repositories::Create;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";
pub const TEST_PASSWORD: &str = "password123";

/// Configurazione di test: limiti larghi, upload in una directory temporanea
pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        stream_api_key: "test-stream-key".to_string(),
        stream_api_secret: "test-stream-secret".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        max_connections: 1,
        client_url: "http://localhost:5173".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        rate_limit_max_requests: 10_000,
        rate_limit_window_secs: 900,
        app_env: "test".to_string(),
    }
}

/// Server di test con il suo stato; la directory degli upload vive quanto il server
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    _upload_dir: TempDir,
}

/// Crea un TestApp a partire dal pool del #[sqlx::test]
pub fn create_test_app(pool: SqlitePool) -> TestApp {
    create_test_app_with(pool, |_| {})
}

/// Come create_test_app, permettendo di modificare la configurazione
pub fn create_test_app_with(pool: SqlitePool, customize: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let mut config = test_config(upload_dir.path());
    customize(&mut config);

    let state = Arc::new(AppState::new(pool, &config));
    let app = server::create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _upload_dir: upload_dir,
    }
}

/// Inserisce un utente con password TEST_PASSWORD (bcrypt a costo minimo)
pub async fn seed_user(state: &AppState, full_name: &str, email: &str, role: UserRole) -> User {
    let password = bcrypt::hash(TEST_PASSWORD, 4).expect("Failed to hash password");
    state
        .user
        .create(&CreateUserDTO {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password,
            role,
        })
        .await
        .expect("Failed to seed user")
}

pub async fn make_friends(state: &AppState, a: &User, b: &User) {
    let request = state
        .friend
        .create(&CreateFriendRequestDTO {
            sender_id: a.user_id,
            recipient_id: b.user_id,
        })
        .await
        .expect("Failed to create friend request");
    state
        .friend
        .update_status(request.request_id, FriendRequestStatus::Accepted)
        .await
        .expect("Failed to accept friend request");
}

pub async fn seed_room(state: &AppState, name: &str, creator: &User, members: &[&User]) -> Room {
    state
        .room
        .create(&CreateRoomDTO {
            name: name.to_string(),
            description: None,
            created_by: creator.user_id,
            member_ids: members.iter().map(|u| u.user_id).collect(),
        })
        .await
        .expect("Failed to seed room")
}

pub async fn link_parent(state: &AppState, parent: &User, child: &User) {
    state
        .parent_link
        .link(parent.user_id, child.user_id)
        .await
        .expect("Failed to link parent");
}

/// Genera un JWT valido per l'utente
pub fn token_for(user: &User) -> String {
    encode_jwt(user.user_id, user.role, TEST_JWT_SECRET).expect("Failed to create JWT token")
}

/// Valore dell'header Authorization per l'utente
pub fn bearer_for(user: &User) -> String {
    format!("Bearer {}", token_for(user))
}
