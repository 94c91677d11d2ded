/**
 * Entrypoint for the `dashboard_api` server.
 *
 * Serves the widget dashboard: the JSON API over the flat-file widget
 * registry, the LLM-backed widget generation and chat endpoints, and the
 * static frontend assets.
 */
use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{self, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    routing::{get, post},
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

mod errors;
mod handlers;
mod state;

use state::{AppContext, Config};

#[tokio::main]
async fn main() -> Result<(), axum::BoxError> {
    // Initialize the application context (which also initializes tracing)
    let context: AppContext = gl_app::create_app_context::<AppContext, Config>().await?;

    // First run gets an empty registry document
    context.store.ensure_initialized().await?;

    // Set up a trace layer
    let trace_layer =
        TraceLayer::new_for_http().on_request(|request: &Request<Body>, _: &tracing::Span| {
            tracing::info!(
                "received request: {method} {uri}",
                method = request.method(),
                uri = request.uri()
            );
        });

    // Set up a CORS layer
    let cors_layer = CorsLayer::new()
        .allow_headers([ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, ORIGIN])
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any);

    let compression_layer = CompressionLayer::new().gzip(true).deflate(true);

    let static_dir = context.config.static_dir.clone();
    let widgets_dir = context.store.widgets_dir().to_path_buf();
    let addr = SocketAddr::from((context.config.host, context.config.port));

    let app = Router::new()
        .route(
            "/api/widgets",
            get(handlers::widgets::list)
                .post(handlers::widgets::create)
                .put(handlers::widgets::replace),
        )
        .route(
            "/api/widgets/{id}",
            get(handlers::widgets::get_one).delete(handlers::widgets::delete),
        )
        .route(
            "/api/widgets/{id}/position",
            post(handlers::widgets::update_position),
        )
        .route("/api/widget-types", get(handlers::widget_types::list))
        .route("/api/widget-types/{id}", get(handlers::widget_types::get_one))
        .route("/api/llm/generate-widget", post(handlers::generate::handler))
        .route("/api/chat", post(handlers::chat::handler))
        .route("/health", get(handlers::health::handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/chat", ServeDir::new(static_dir.join("chat")))
        .nest_service("/widgets", ServeDir::new(&widgets_dir))
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "application/json")],
                Json(json!({
                    "message": "not found",
                })),
            )
        })
        .layer(cors_layer)
        .layer(trace_layer)
        .layer(compression_layer)
        .with_state(context);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::warn!("signal received, starting graceful shutdown");
}
