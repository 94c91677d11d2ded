use axum::{extract::State, response::IntoResponse, Json};
use openai_dive::v1::api::Client;
use openai_dive::v1::resources::chat::{
    ChatCompletionParameters, ChatMessage, ChatMessageContent,
};
use serde_json::json;
use widget_codegen::{first_choice_text, GenerationError};

use crate::errors::ApiError;
use crate::state::AppContext;

const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble processing your request right now. Please try again later.";

/// `POST /api/chat` - the dashboard assistant.
///
/// Only the missing-message case is a real error; everything after
/// validation degrades to a canned reply so the end user never sees a raw
/// backend failure. No other endpoint is allowed to swallow errors like
/// this.
pub async fn handler(
    State(ctx): State<AppContext>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let message = payload
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::Validation("No message provided".to_string()))?
        .to_string();

    let reply = match assistant_reply(&ctx, &message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("error communicating with LLM: {e}");
            FALLBACK_REPLY.to_string()
        }
    };

    // reloadWidgets stays empty for now; the assistant does not yet drive
    // widget refreshes
    Ok(Json(json!({ "reply": reply, "reloadWidgets": [] })))
}

async fn assistant_reply(ctx: &AppContext, message: &str) -> Result<String, ApiError> {
    let registry = ctx.store.load().await?;

    let system_prompt = build_system_prompt(
        &registry
            .widget_types
            .iter()
            .map(|wt| wt.id.as_str())
            .collect::<Vec<_>>(),
        registry.widgets.len(),
    );

    let client = Client::new(ctx.config.openai_api_key.expose_secret().to_string());

    let parameters = ChatCompletionParameters {
        model: ctx.config.chat_model.clone(),
        messages: vec![
            ChatMessage::System {
                name: None,
                content: ChatMessageContent::Text(system_prompt),
            },
            ChatMessage::User {
                name: None,
                content: ChatMessageContent::Text(message.to_string()),
            },
        ],
        temperature: Some(0.7),
        max_tokens: Some(300),
        ..Default::default()
    };

    let response = client
        .chat()
        .create(parameters)
        .await
        .map_err(GenerationError::from)?;

    let reply = first_choice_text(&response).ok_or(GenerationError::EmptyReply)?;

    Ok(reply.trim().to_string())
}

fn build_system_prompt(type_ids: &[&str], instance_count: usize) -> String {
    let available = if type_ids.is_empty() {
        "None".to_string()
    } else {
        type_ids.join(", ")
    };

    format!(
        "You are a helpful assistant managing a widget dashboard.\n\
         You help users create, customize, and manage widgets.\n\
         \n\
         Current system state:\n\
         - Available widget types: {available}\n\
         - Active widget instances: {instance_count}\n\
         \n\
         Your responses should be helpful, concise and informative."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_context;

    #[tokio::test]
    async fn test_missing_message_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = handler(State(ctx), Json(json!({}))).await else {
            panic!("expected a validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_message_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path()).await;

        let Err(err) = handler(State(ctx), Json(json!({"message": ""}))).await else {
            panic!("expected a validation error");
        };
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_system_prompt_summarizes_state() {
        let prompt = build_system_prompt(&["clock", "xkcd"], 3);
        assert!(prompt.contains("Available widget types: clock, xkcd"));
        assert!(prompt.contains("Active widget instances: 3"));
    }

    #[test]
    fn test_system_prompt_with_no_types() {
        let prompt = build_system_prompt(&[], 0);
        assert!(prompt.contains("Available widget types: None"));
    }
}
