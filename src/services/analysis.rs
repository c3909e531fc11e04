//! AI services - Analisi delle conversazioni di uno studente per il genitore collegato

use crate::analysis::ChatAnalysis;
use crate::core::{AppError, AppState};
use crate::dtos::{AnalyzeChatRequestDTO, MessageTarget, analysis::DEFAULT_ANALYSIS_LIMIT};
use crate::entities::User;
use crate::repositories::Read;
use crate::services::user::ensure_parent_of;
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, child_id = %body.child_id))]
pub async fn analyze_chat(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<AnalyzeChatRequestDTO>,
) -> Result<Json<ChatAnalysis>, AppError> {
    // 1. Il chiamante deve essere genitore collegato allo studente
    // 2. Esattamente una conversazione: interlocutore diretto oppure stanza
    // 3. Caricare gli ultimi `limit` messaggi ed eseguire l'analizzatore
    body.validate()?;
    let child = ensure_parent_of(&state, &current_user, body.child_id).await?;

    let target = MessageTarget::from_parts(body.partner_id, body.room_id)
        .ok_or_else(|| AppError::bad_request("Provide exactly one of partnerId or roomId"))?;
    let limit = body.limit.unwrap_or(DEFAULT_ANALYSIS_LIMIT);

    let mut messages = match target {
        MessageTarget::Direct(partner_id) => {
            state
                .user
                .read(&partner_id)
                .await?
                .ok_or_else(|| AppError::not_found("Partner not found"))?;
            state
                .msg
                .find_direct_messages(child.user_id, partner_id, None, limit)
                .await?
        }
        MessageTarget::Room(room_id) => {
            state
                .room
                .read(&room_id)
                .await?
                .ok_or_else(|| AppError::not_found("Room not found"))?;
            if !state.room.is_member(room_id, child.user_id).await? {
                return Err(AppError::forbidden("The student is not a member of this room"));
            }
            state.msg.find_room_messages(room_id, None, limit).await?
        }
    };

    // in ordine cronologico per l'analizzatore
    messages.reverse();
    let analysis = state.analyzer.analyze(child.user_id, &messages);

    info!(
        "Analyzed {} messages, risk level {:?}",
        analysis.messages_analyzed, analysis.risk_level
    );
    Ok(Json(analysis))
}
