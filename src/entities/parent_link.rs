//! ParentLink entity - Collegamento genitore -> studente

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ParentLink {
    pub parent_id: i32,
    pub child_id: i32,
    pub created_at: DateTime<Utc>,
}
