use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::Request,
    response::{Json, Response},
    routing::get,
    Router,
};
use runtime::ServerConfig;
use serde_json::{json, Value};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{field::Empty, Span};
use user_accounts::UserAccounts;

use crate::request_id::{self, MakeReqId};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Full application router: health check, module routes and the HTTP middleware stack.
pub fn build_router(accounts: &UserAccounts, server: &ServerConfig) -> Router {
    let router = Router::new().route("/health", get(health_check));
    let router = accounts.register_rest(router);
    apply_http_layers(router, server.timeout_sec)
}

/// Middleware order, outermost to innermost:
/// SetRequestId -> PropagateRequestId -> Trace -> Timeout
pub fn apply_http_layers(mut router: Router, timeout_sec: u64) -> Router {
    let x_request_id = request_id::header();

    if timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(timeout_sec)));
    }

    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    version = ?req.version(),
                    request_id = %request_id::request_id_of(req),
                    status = Empty,
                    latency_ms = Empty
                )
            })
            .on_response(|res: &Response, latency: Duration, span: &Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis() as u64);
                tracing::info!("request completed");
            }),
    );

    // Echo the id back on the response
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));

    // Generate x-request-id when the client did not send one
    router.layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

/// Bind and serve until SIGINT/SIGTERM, then drain in-flight requests.
pub async fn serve(router: Router, server: &ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("Cannot bind {}:{}", server.host, server.port))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = async {
        if let Err(e) = wait_for_shutdown().await {
            tracing::warn!("shutdown: signal listener failed ({e}); falling back to ctrl_c()");
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?; // Ctrl+C
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
