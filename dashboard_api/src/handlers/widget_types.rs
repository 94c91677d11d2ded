use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::errors::ApiError;
use crate::state::AppContext;

/// `GET /api/widget-types` - registry-declared types plus any discovered
/// from widget directories on disk.
pub async fn list(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let widget_types = ctx.store.list_widget_types().await?;

    Ok(Json(json!({ "widgetTypes": widget_types })))
}

/// `GET /api/widget-types/{id}` - one type, falling back to its on-disk
/// manifest when the registry does not declare it.
pub async fn get_one(
    Path(id): Path<String>,
    State(ctx): State<AppContext>,
) -> Result<impl IntoResponse, ApiError> {
    let details = ctx
        .store
        .get_widget_type(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Widget type {id} not found")))?;

    Ok(Json(details))
}
