use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use types::{WidgetManifest, WidgetType};
use widget_registry::StorageError;

use crate::errors::ApiError;
use crate::state::AppContext;

const MANIFEST_VERSION: &str = "1.0.0";
const MANIFEST_ICON: &str = "🔌";

/// `POST /api/llm/generate-widget` - generate a brand-new widget type.
///
/// Validation and the type-id collision check both happen before any file
/// I/O or LLM traffic. On success the generated source and manifest land
/// in the type's directory and the type is registered.
pub async fn handler(
    State(ctx): State<AppContext>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(id), Some(name), Some(description)) = (
        field(&payload, "id"),
        field(&payload, "name"),
        field(&payload, "description"),
    ) else {
        return Err(ApiError::Validation(
            "Required fields missing: id, name, and description are required".to_string(),
        ));
    };

    let registry = ctx.store.load().await?;
    if registry.widget_types.iter().any(|wt| wt.id == id) {
        return Err(ApiError::Conflict(format!(
            "Widget type '{id}' already exists"
        )));
    }

    let code = ctx.generator.generate(id, name, description).await?;

    let manifest = WidgetManifest {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        version: Some(MANIFEST_VERSION.to_string()),
        icon: Some(MANIFEST_ICON.to_string()),
    };

    write_widget_artifacts(&ctx, &manifest, &code).await?;

    ctx.store
        .register_widget_type(WidgetType {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "widget": manifest,
        "message": format!("Widget '{name}' created successfully"),
    })))
}

fn field<'a>(payload: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(serde_json::Value::as_str)
}

async fn write_widget_artifacts(
    ctx: &AppContext,
    manifest: &WidgetManifest,
    code: &str,
) -> Result<(), StorageError> {
    let widget_dir = ctx.store.widgets_dir().join(&manifest.id);

    tokio::fs::create_dir_all(widget_dir.join("assets")).await?;
    tokio::fs::write(widget_dir.join("widget.js"), code).await?;

    let raw = serde_json::to_string_pretty(manifest)?;
    tokio::fs::write(widget_dir.join("manifest.json"), raw).await?;

    Ok(())
}
