use std::net::IpAddr;
use std::path::PathBuf;

use redact::Secret;
use serde::Deserialize;
use widget_codegen::WidgetGenerator;
use widget_registry::RegistryStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Defaults to `{static_dir}/widgets` when unset.
    #[serde(default)]
    pub widgets_dir: Option<PathBuf>,

    pub openai_api_key: Secret<String>,

    #[serde(default = "default_codegen_model")]
    pub codegen_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_codegen_model() -> String {
    "gpt-4".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub store: RegistryStore,
    pub generator: WidgetGenerator,
    pub config: Config,
}

impl gl_app::ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        let widgets_dir = config
            .widgets_dir
            .clone()
            .unwrap_or_else(|| config.static_dir.join("widgets"));
        let store = RegistryStore::new(widgets_dir);

        let base_template = widget_codegen::load_base_template(&config.static_dir).await;
        let generator = WidgetGenerator::new(
            config.openai_api_key.clone(),
            config.codegen_model.clone(),
            base_template,
        );

        Self {
            store,
            generator,
            config,
        }
    }
}

#[cfg(test)]
pub(crate) async fn test_context(root: &std::path::Path) -> AppContext {
    use gl_app::ContextProvider;

    let config = Config {
        host: default_host(),
        port: 0,
        static_dir: root.join("static"),
        widgets_dir: Some(root.join("widgets")),
        openai_api_key: Secret::new("test-key".to_string()),
        codegen_model: default_codegen_model(),
        chat_model: default_chat_model(),
    };

    let context = AppContext::new(config).await;
    context.store.ensure_initialized().await.unwrap();
    context
}
