use figment::{Figment, providers::Env};
use tracing_subscriber::prelude::*;

pub trait ContextProvider<Config> {
    fn new(config: Config) -> impl Future<Output = Self>;
}

/// Initialize the application context with configuration from environment variables.
/// The configuration is extracted using figment.
///
/// Also installs the process-wide tracing subscriber, so this must be
/// called exactly once, before anything logs.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables.
///
pub async fn create_app_context<'a, A, Config: serde::Deserialize<'a>>()
-> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
{
    init_tracer();

    let figment = Figment::new().merge(Env::raw());

    let config: Config = figment.extract()?;

    let context = A::new(config).await;

    Ok(context)
}

fn init_tracer() {
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        // allow log level to be overridden by RUST_LOG env var
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
