use serde::{Deserialize, Serialize};

/// The persisted registry document.
///
/// Serialized shape matches the frontend contract:
/// `{"widgetTypes": [...], "widgets": [...]}`. Both sequences keep
/// insertion order; nothing here enforces id uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Registry {
    #[serde(rename = "widgetTypes", default)]
    pub widget_types: Vec<WidgetType>,

    #[serde(default)]
    pub widgets: Vec<WidgetInstance>,
}

/// A registered, reusable kind of dashboard widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetType {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// A placed occurrence of a widget type on the dashboard.
///
/// Instances are open records: only `id` and `type` are required, and
/// any other fields the frontend stores ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: String,

    #[serde(rename = "type")]
    pub widget_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,

    pub y: f64,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-widget-type metadata stored as `manifest.json` in the type's
/// directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetManifest {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// What a widget-type lookup yields: either the registry entry or, for
/// types only present on disk, the full manifest contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WidgetTypeDetails {
    Manifest(WidgetManifest),
    Registered(WidgetType),
}
