use axum::{extract::State, Json};
use grubot_core::{directory, AppState};
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let subscribers = directory::count(&state.db).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": subscribers,
    })))
}
