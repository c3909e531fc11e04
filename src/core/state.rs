//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::analysis::{ChatAnalyzer, LexiconAnalyzer};
use crate::core::auth::TokenBlacklist;
use crate::core::config::Config;
use crate::core::rate_limit::RateLimiter;
use crate::repositories::{
    AttachmentRepository, FriendRequestRepository, MessageRepository, ParentLinkRepository,
    RoomRepository, UserRepository,
};
use crate::storage::FileStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per stanze e membri
    pub room: RoomRepository,

    /// Repository per messaggi di stanza e diretti
    pub msg: MessageRepository,

    pub attachment: AttachmentRepository,

    pub friend: FriendRequestRepository,

    pub parent_link: ParentLinkRepository,

    /// Pool condiviso, usato direttamente solo dall'health check
    pub pool: SqlitePool,

    /// Secret key per JWT token
    pub jwt_secret: String,

    pub stream_api_key: String,
    pub stream_api_secret: String,

    /// Cookie con flag Secure (solo in produzione)
    pub secure_cookies: bool,

    pub max_upload_bytes: usize,

    pub blacklist: TokenBlacklist,
    pub rate_limiter: RateLimiter,
    pub files: FileStore,
    pub analyzer: Arc<dyn ChatAnalyzer>,

    pub started_at: Instant,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni SQLite condiviso
    /// * `config` - Configurazione caricata da env
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            room: RoomRepository::new(pool.clone()),
            msg: MessageRepository::new(pool.clone()),
            attachment: AttachmentRepository::new(pool.clone()),
            friend: FriendRequestRepository::new(pool.clone()),
            parent_link: ParentLinkRepository::new(pool.clone()),
            pool,
            jwt_secret: config.jwt_secret.clone(),
            stream_api_key: config.stream_api_key.clone(),
            stream_api_secret: config.stream_api_secret.clone(),
            secure_cookies: config.is_production(),
            max_upload_bytes: config.max_upload_bytes,
            blacklist: TokenBlacklist::new(),
            rate_limiter: RateLimiter::new(
                config.rate_limit_max_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            ),
            files: FileStore::new(config.upload_dir.clone()),
            analyzer: Arc::new(LexiconAnalyzer),
            started_at: Instant::now(),
        }
    }
}
