use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use types::{Position, Registry, WidgetInstance};

use crate::errors::ApiError;
use crate::state::AppContext;

/// `GET /api/widgets` - the full registry document.
pub async fn list(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    let registry = ctx.store.load().await?;

    Ok(Json(registry))
}

/// `POST /api/widgets` - append one widget instance.
pub async fn create(
    State(ctx): State<AppContext>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let widget = payload
        .get("widget")
        .cloned()
        .and_then(|value| serde_json::from_value::<WidgetInstance>(value).ok())
        .ok_or_else(|| {
            ApiError::Validation(
                "Required fields missing: widget with id and type are required".to_string(),
            )
        })?;

    ctx.store.append_widget(widget.clone()).await?;

    Ok(Json(json!({ "success": true, "widget": widget })))
}

/// `PUT /api/widgets` - replace the entire registry (bulk client sync).
pub async fn replace(
    State(ctx): State<AppContext>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.get("widgets").is_none() {
        return Err(ApiError::Validation(
            "Required field missing: widgets".to_string(),
        ));
    }

    let registry: Registry = serde_json::from_value(payload)
        .map_err(|e| ApiError::Validation(format!("invalid registry document: {e}")))?;

    ctx.store.replace_all(&registry).await?;

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/widgets/{id}` - one widget instance.
pub async fn get_one(
    Path(id): Path<String>,
    State(ctx): State<AppContext>,
) -> Result<impl IntoResponse, ApiError> {
    let widget = ctx
        .store
        .find_widget(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Widget instance {id} not found")))?;

    Ok(Json(widget))
}

/// `POST /api/widgets/{id}/position` - move a widget.
pub async fn update_position(
    Path(id): Path<String>,
    State(ctx): State<AppContext>,
    Json(position): Json<Position>,
) -> Result<impl IntoResponse, ApiError> {
    let found = ctx.store.upsert_widget_position(&id, position).await?;

    if !found {
        return Err(ApiError::NotFound(format!("Widget {id} not found")));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Position updated for widget {id}"),
    })))
}

/// `DELETE /api/widgets/{id}` - remove a widget instance.
pub async fn delete(
    Path(id): Path<String>,
    State(ctx): State<AppContext>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = ctx.store.remove_widget(&id).await?;

    if !removed {
        return Err(ApiError::NotFound(format!("Widget {id} not found")));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Widget {id} removed from registry"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_context;

    #[tokio::test]
    async fn test_create_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let payload = json!({"widget": {"id": "w1", "type": "clock"}});
        let response = create(State(ctx.clone()), Json(payload))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), 200);

        let widget = ctx.store.find_widget("w1").await.unwrap().unwrap();
        assert_eq!(widget.widget_type, "clock");
    }

    #[tokio::test]
    async fn test_create_rejects_widget_without_type() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let payload = json!({"widget": {"id": "w1"}});
        let Err(err) = create(State(ctx.clone()), Json(payload)).await else {
            panic!("expected a validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(ctx.store.load().await.unwrap().widgets.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_widget_key() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = create(State(ctx), Json(json!({}))).await else {
            panic!("expected a validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_replace_requires_widgets_key() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = replace(State(ctx), Json(json!({"widgetTypes": []}))).await else {
            panic!("expected a validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_replace_overwrites_document() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;
        ctx.store
            .append_widget(WidgetInstance {
                id: "old".to_string(),
                widget_type: "clock".to_string(),
                position: None,
                extra: serde_json::Map::new(),
            })
            .await
            .unwrap();

        let payload = json!({
            "widgetTypes": [],
            "widgets": [{"id": "new", "type": "notes"}],
        });
        replace(State(ctx.clone()), Json(payload)).await.unwrap();

        let registry = ctx.store.load().await.unwrap();
        assert_eq!(registry.widgets.len(), 1);
        assert_eq!(registry.widgets[0].id, "new");
    }

    #[tokio::test]
    async fn test_get_one_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = get_one(Path("ghost".to_string()), State(ctx)).await else {
            panic!("expected a not-found error");
        };
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_position_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let position = Position {
            x: 1.0,
            y: 2.0,
            extra: serde_json::Map::new(),
        };
        let Err(err) = update_position(Path("ghost".to_string()), State(ctx), Json(position)).await
        else {
            panic!("expected a not-found error");
        };
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_instance() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;
        ctx.store
            .append_widget(WidgetInstance {
                id: "w1".to_string(),
                widget_type: "clock".to_string(),
                position: None,
                extra: serde_json::Map::new(),
            })
            .await
            .unwrap();

        let response = delete(Path("w1".to_string()), State(ctx.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), 200);
        assert!(ctx.store.load().await.unwrap().widgets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = delete(Path("ghost".to_string()), State(ctx)).await else {
            panic!("expected a not-found error");
        };
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
