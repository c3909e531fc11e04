//! Health service - Stato del server, del database e memoria del processo

use crate::core::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{error, instrument};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthDTO {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_secs: u64,
    pub memory_mb: f64,
    pub timestamp: DateTime<Utc>,
}

/// Memoria residente del processo corrente in MB
fn process_memory_mb() -> f64 {
    let mut sys = System::new();
    let pid = Pid::from_u32(std::process::id());
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid)
        .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

#[instrument(skip(state))]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthDTO>) {
    let database_ok = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            error!("Health check database probe failed: {}", e);
            false
        }
    };

    let (status_code, status, database) = if database_ok {
        (StatusCode::OK, "ok", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        status_code,
        Json(HealthDTO {
            status,
            database,
            uptime_secs: state.started_at.elapsed().as_secs(),
            memory_mb: (process_memory_mb() * 100.0).round() / 100.0,
            timestamp: Utc::now(),
        }),
    )
}
