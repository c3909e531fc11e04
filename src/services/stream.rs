//! Stream token service - Token per il client di chat esterno

use crate::core::{AppError, AppState};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, State},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Serialize)]
struct StreamClaims {
    user_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StreamTokenDTO {
    pub token: String,
    pub api_key: String,
    pub user_id: String,
}

/// Token HS256 senza scadenza, come quelli emessi lato server dal servizio di chat
pub fn create_stream_token(user_id: i32, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = StreamClaims {
        user_id: user_id.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_stream_token(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<StreamTokenDTO>, AppError> {
    let token = create_stream_token(current_user.user_id, &state.stream_api_secret).map_err(|e| {
        error!("Failed to sign stream token: {}", e);
        AppError::internal_server_error("Could not create chat token")
    })?;

    Ok(Json(StreamTokenDTO {
        token,
        api_key: state.stream_api_key.clone(),
        user_id: current_user.user_id.to_string(),
    }))
}
