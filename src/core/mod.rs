//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori
//! - Rate limiting
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    Claims, TokenBlacklist, authentication_middleware, decode_jwt, encode_jwt, require_role,
    room_membership_middleware,
};
pub use config::Config;
pub use error::AppError;
pub use rate_limit::{RateLimiter, rate_limit_middleware};
pub use state::AppState;
