//! Auth services - Gestione autenticazione, registrazione e sessione

use crate::core::auth::{SESSION_TTL_DAYS, extract_token, session_cookie};
use crate::core::{AppError, AppState, decode_jwt, encode_jwt};
use crate::dtos::{AuthResponseDTO, CreateUserDTO, LoginDTO, SignupDTO, UpdateProfileDTO, UserDTO};
use crate::entities::{User, UserRole};
use crate::repositories::{Create, Update};
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    raw.parse::<UserRole>().map_err(|e| {
        warn!("Rejected role value: {}", raw);
        AppError::bad_request("Invalid role").with_details(e)
    })
}

/// Header di sessione: cookie HttpOnly + Authorization per i client non browser
fn session_headers(state: &AppState, token: &str) -> Result<HeaderMap, AppError> {
    let cookie = session_cookie(token, SESSION_TTL_DAYS * 24 * 60 * 60, state.secure_cookies);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| AppError::internal_server_error("Failed to build session cookie"))?,
    );
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Failed to build session header"))?,
    );
    Ok(headers)
}

#[instrument(skip(state, body), fields(email = %body.email, role = %body.role))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Signup request");
    // 1. Validare il DTO (nome, email, password) e il ruolo contro l'enum
    // 2. Verificare che l'email non sia già registrata (CONFLICT)
    // 3. Per i genitori: child_email obbligatoria e deve indicare uno studente esistente
    // 4. Hash della password e creazione dell'utente
    // 5. Per i genitori: creare il collegamento con lo studente
    // 6. Generare il token e ritornare 201 con cookie di sessione
    body.validate()?;
    let role = parse_role(&body.role)?;

    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Email already registered");
        return Err(AppError::conflict("Email already exists, please use a different one"));
    }

    let child = if role == UserRole::Parent {
        let child_email = body.child_email.as_deref().ok_or_else(|| {
            AppError::bad_request("Parent accounts must specify the child's email")
        })?;
        let child = state
            .user
            .find_by_email(child_email)
            .await?
            .filter(|u| u.has_role(UserRole::Student))
            .ok_or_else(|| {
                warn!("Parent signup with unknown child email");
                AppError::bad_request("No student account found for the child's email")
            })?;
        Some(child)
    } else {
        None
    };

    let password_hash = User::hash_password(&body.password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let user = state
        .user
        .create(&CreateUserDTO {
            full_name: body.full_name,
            email: body.email,
            password: password_hash,
            role,
        })
        .await?;

    if let Some(child) = child {
        state.parent_link.link(user.user_id, child.user_id).await?;
    }

    let token = encode_jwt(user.user_id, user.role, &state.jwt_secret)?;
    let headers = session_headers(&state, &token)?;

    info!("User {} signed up as {}", user.user_id, user.role);
    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponseDTO {
            success: true,
            user: UserDTO::from(user),
            token: Some(token),
        }),
    ))
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Login request");
    // 1. Se il client indica un ruolo, deve appartenere all'enum (BAD_REQUEST)
    // 2. Cercare l'utente per email, UNAUTHORIZED se assente o password errata
    // 3. Se il ruolo indicato non coincide con quello dell'account: FORBIDDEN
    // 4. Generare il token e impostare cookie + Authorization
    let requested_role = body.role.as_deref().map(parse_role).transpose()?;

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) if user.verify_password(&body.password) => user,
        _ => {
            warn!("Invalid credentials");
            return Err(AppError::unauthorized("Invalid email or password"));
        }
    };

    if let Some(role) = requested_role {
        if role != user.role {
            warn!("Login as {} rejected for {} account", role, user.role);
            return Err(AppError::forbidden("Role does not match this account"));
        }
    }

    let token = encode_jwt(user.user_id, user.role, &state.jwt_secret)?;
    let headers = session_headers(&state, &token)?;

    info!("User {} logged in", user.user_id);
    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponseDTO {
            success: true,
            user: UserDTO::from(user),
            token: Some(token),
        }),
    ))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    // Il cookie viene cancellato sempre; il token presentato (se valido) viene revocato
    if let Some(token) = extract_token(&headers) {
        if let Ok(data) = decode_jwt(&token, &state.jwt_secret) {
            state.blacklist.revoke(&data.claims);
            info!("Session revoked for user {}", data.claims.id);
        }
    }

    let cookie = session_cookie("", 0, state.secure_cookies);
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| AppError::internal_server_error("Failed to build session cookie"))?,
    );

    Ok((
        StatusCode::OK,
        response_headers,
        Json(serde_json::json!({ "success": true, "message": "Logout successful" })),
    ))
}

#[instrument(skip(current_user), fields(user_id = %current_user.user_id))]
pub async fn me(Extension(current_user): Extension<User>) -> Json<AuthResponseDTO> {
    Json(AuthResponseDTO {
        success: true,
        user: UserDTO::from(current_user),
        token: None,
    })
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn onboard(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<Json<AuthResponseDTO>, AppError> {
    body.validate()?;

    let updated = state.user.update(&current_user.user_id, &body).await?;

    info!("User onboarded");
    Ok(Json(AuthResponseDTO {
        success: true,
        user: UserDTO::from(updated),
        token: None,
    }))
}
