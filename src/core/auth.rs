use crate::core::{AppError, AppState};
use crate::entities::{User, UserRole};
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::HeaderMap, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Nome del cookie di sessione
pub const SESSION_COOKIE: &str = "jwt";

/// Durata del token e del cookie di sessione
pub const SESSION_TTL_DAYS: i64 = 7;

// struct che codifica il contenuto del token jwt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub jti: String,
    pub id: i32,
    pub role: UserRole,
}

#[instrument(skip(secret), fields(id = %id, role = %role))]
pub fn encode_jwt(id: i32, role: UserRole, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let exp: usize = (now + Duration::days(SESSION_TTL_DAYS)).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        id,
        role,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map(|token| {
        info!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| {
        debug!("JWT token decoded successfully for user: {}", data.claims.id);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Token revocati al logout, indicizzati per jti con la loro scadenza
#[derive(Default)]
pub struct TokenBlacklist {
    revoked: DashMap<String, usize>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, claims: &Claims) {
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// I token scaduti vengono comunque rifiutati da decode_jwt
    pub fn purge_expired(&self) {
        let now = Utc::now().timestamp() as usize;
        self.revoked.retain(|_, exp| *exp > now);
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

/// Estrae il token dal cookie di sessione, altrimenti dall'header Authorization
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    if from_cookie.is_some() {
        return from_cookie;
    }

    let auth_header = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = auth_header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Header Set-Cookie per la sessione; Max-Age=0 lo cancella
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    )
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let token = extract_token(req.headers()).ok_or_else(|| {
        warn!("Missing authentication token");
        AppError::unauthorized("Unauthorized - No token provided")
    })?;

    let token_data = decode_jwt(&token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unauthorized - Invalid token"))?;

    if state.blacklist.is_revoked(&token_data.claims.jti) {
        warn!("Revoked token presented for user {}", token_data.claims.id);
        return Err(AppError::unauthorized("Unauthorized - Token revoked"));
    }

    // Fetch the user details from the database
    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) => {
            debug!("User authenticated: {}", user.user_id);
            user
        }
        None => {
            warn!("User not found in database: {}", token_data.claims.id);
            return Err(AppError::unauthorized("Unauthorized - User not found"));
        }
    };

    req.extensions_mut().insert(current_user);
    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente sia membro della stanza specificata
/// Estrae room_id dal path, carica la stanza e la inserisce nell'Extension
#[instrument(skip(state, req, next))]
pub async fn room_membership_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running room membership middleware");
    // 1. Ottenere l'utente corrente dall'Extension (inserito dall'authentication_middleware)
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    // 2. Estrarre room_id dal path (primo segmento numerico)
    let room_id: i32 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i32>().ok())
        .ok_or_else(|| {
            warn!("Room ID not found in path: {}", req.uri().path());
            AppError::bad_request("Room ID not found in path")
        })?;

    // 3. La stanza deve esistere, poi la membership
    let room = state.room.read(&room_id).await?.ok_or_else(|| {
        warn!("Room {} not found", room_id);
        AppError::not_found("Room not found")
    })?;

    if !state.room.is_member(room_id, current_user.user_id).await? {
        warn!("User {} is not a member of room {}", current_user.user_id, room_id);
        return Err(AppError::forbidden("You are not a member of this room"));
    }

    debug!("User {} verified as member of room {}", current_user.user_id, room_id);
    req.extensions_mut().insert(room);

    Ok(next.run(req).await)
}

/// Helper function per verificare che un utente abbia uno dei ruoli richiesti
///
/// # Returns
/// * `Ok(())` se il ruolo è permesso
/// * `Err(AppError)` 403 se il ruolo non è tra quelli permessi
pub fn require_role(user: &User, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    if !allowed_roles.contains(&user.role) {
        warn!(
            "User {} has insufficient role {:?}, required one of: {:?}",
            user.user_id, user.role, allowed_roles
        );
        return Err(AppError::forbidden("Insufficient role").with_details(format!(
            "This action requires one of the following roles: {}",
            allowed_roles
                .iter()
                .map(UserRole::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    debug!("Role check passed for user {} with role {}", user.user_id, user.role);
    Ok(())
}
