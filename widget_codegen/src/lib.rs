//! Widget implementation generation via an OpenAI chat model.
//!
//! Given a widget id, display name, and description, this builds a prompt
//! around the frontend's `WidgetBase` class, asks the model for a complete
//! web-component implementation, and extracts the code from the free-text
//! reply.

use std::path::Path;

use openai_dive::v1::api::Client;
use openai_dive::v1::error::APIError;
use openai_dive::v1::resources::chat::{
    ChatCompletionParameters, ChatCompletionResponse, ChatMessage, ChatMessageContent,
};
use redact::Secret;
use thiserror::Error;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates clean, efficient web component code.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("chat completion request failed: {0}")]
    Api(#[from] APIError),
    #[error("chat completion returned no usable reply")]
    EmptyReply,
}

/// Generates widget implementations. Holds the API key and the spliced
/// `WidgetBase` template; constructed once at startup and passed in
/// wherever generation happens, never reached for as a global.
#[derive(Debug, Clone)]
pub struct WidgetGenerator {
    api_key: Secret<String>,
    model: String,
    base_template: String,
}

impl WidgetGenerator {
    pub fn new(api_key: Secret<String>, model: impl Into<String>, base_template: String) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_template,
        }
    }

    /// Ask the model for a widget implementation and extract the code from
    /// its reply.
    ///
    /// The call has no timeout or retry; it is as slow and as fallible as
    /// the upstream API.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` if the API call fails or the reply has
    /// no usable text.
    #[tracing::instrument(skip(self, description))]
    pub async fn generate(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(id, name, description, &self.base_template);

        let client = Client::new(self.api_key.expose_secret().to_string());

        let parameters = ChatCompletionParameters {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::System {
                    name: None,
                    content: ChatMessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage::User {
                    name: None,
                    content: ChatMessageContent::Text(prompt),
                },
            ],
            temperature: Some(0.5),
            max_tokens: Some(2000),
            ..Default::default()
        };

        let response = client.chat().create(parameters).await?;

        match response.choices.first().and_then(|c| c.finish_reason.as_ref()) {
            Some(reason) => tracing::info!("finish reason: {:?}", reason),
            None => tracing::info!("no finish reason provided"),
        }

        let reply = first_choice_text(&response).ok_or(GenerationError::EmptyReply)?;

        Ok(extract_code_block(reply.trim()))
    }
}

/// Text content of the first assistant choice, if the response carries
/// one.
#[must_use]
pub fn first_choice_text(response: &ChatCompletionResponse) -> Option<String> {
    let choice = response.choices.first()?;

    match &choice.message {
        ChatMessage::Assistant {
            content: Some(ChatMessageContent::Text(text)),
            ..
        } => Some(text.clone()),
        _ => None,
    }
}

/// Read `static/js/widget-base.js` and splice out the class definition to
/// embed in the prompt. Degrades to a placeholder comment when the file or
/// the class marker is missing; generation still works, just without the
/// base-class context.
pub async fn load_base_template(static_dir: &Path) -> String {
    let path = static_dir.join("js").join("widget-base.js");

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                "widget base class file not readable at {}: {e}",
                path.display()
            );
            return "// WidgetBase class file not found".to_string();
        }
    };

    splice_base_class(&content)
}

/// Cut the `WidgetBase` class body out of the module source: everything
/// from the `export class WidgetBase` marker onward, re-prefixed without
/// the `export` and with the final closing brace trimmed.
///
/// This is plain substring surgery, not JS parsing; it assumes the class
/// is the last item in the file, which holds for the shipped frontend.
#[must_use]
pub fn splice_base_class(source: &str) -> String {
    let Some((_, body)) = source.split_once("export class WidgetBase") else {
        tracing::warn!("could not find the WidgetBase class definition");
        return "// WidgetBase class definition not found in file".to_string();
    };

    let class_def = format!("class WidgetBase{body}");

    match class_def.trim_end().strip_suffix('}') {
        Some(inner) => inner.trim().to_string(),
        None => class_def,
    }
}

/// First fenced code block of the reply, with an optional language-tag
/// line (`javascript`/`js`) dropped. A reply without fences is taken to be
/// code in its entirety.
///
/// Known limitation: a reply with several fenced blocks, or with prose
/// inside the first fence, comes out wrong. Good enough for replies that
/// follow the prompt's "return only the code" instruction.
#[must_use]
pub fn extract_code_block(reply: &str) -> String {
    let Some(start) = reply.find("```") else {
        return reply.to_string();
    };

    let after = &reply[start + 3..];
    let block = match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    };

    match block.split_once('\n') {
        Some((tag, rest)) if matches!(tag.trim(), "javascript" | "js" | "") => rest.to_string(),
        _ => block.to_string(),
    }
}

/// `clock` -> `ClockWidget`; the class name the prompt asks the model to
/// use.
#[must_use]
pub fn widget_class_name(id: &str) -> String {
    format!("{}Widget", capitalize(id))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}

#[must_use]
pub fn build_prompt(id: &str, name: &str, description: &str, base_template: &str) -> String {
    let class_name = widget_class_name(id);

    format!(
        r#"
You are a web component expert tasked with creating a "{name}" widget.
Description: {description}

The widget should be a custom element that extends the WidgetBase class which provides common widget functionality.
Here's the WidgetBase class implementation you should extend:

{base_template}

Please create a complete web component implementation for this widget with the following requirements:
1. It should extend WidgetBase and be named {class_name}
2. It should be registered as a custom element named "{id}-widget"
3. It must start with this import: `import {{ html, css, LitElement }} from 'https://cdn.jsdelivr.net/gh/lit/dist@3/core/lit-core.min.js';`
4. It must also import the WidgetBase: `import {{ WidgetBase }} from '/js/widget-base.js';`
5. If it needs to access external APIs, use the fetchData method from the base class
6. Implement any specific functionality needed for this widget type
7. Keep styling consistent with the base widget but add widget-specific styles if needed
8. Only include code for this specific widget, don't include the WidgetBase code
9. Make sure to handle component lifecycle properly (connectedCallback, disconnectedCallback if needed)
10. End the file with `customElements.define('{id}-widget', {class_name});`

Important tips:
- The WidgetBase already provides dragging, styling, and positioning functionality
- Override the static styles getter to extend the base styles (use super.styles in an array)
- Follow the pattern shown in the base class for handling events
- The base widget has a slot for content in the widget-content area
- Remember to bind event handlers if you add any

Return only the JavaScript code with no explanations or additional text.
"#
    )
}
