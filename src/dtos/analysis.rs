//! Analysis DTOs - Richiesta di analisi di una conversazione

use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_ANALYSIS_LIMIT: i64 = 100;

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeChatRequestDTO {
    pub child_id: i32,
    pub partner_id: Option<i32>,
    pub room_id: Option<i32>,
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}
