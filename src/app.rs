use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, field, info_span, warn, Span};

use crate::{auth, state::AppState, tutor, users};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(tutor::router()),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_status),
        )
}

fn request_span(req: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %req.method(),
        path = req.uri().path(),
        status = field::Empty,
    )
}

fn record_status(res: &Response, latency: Duration, span: &Span) {
    let status = res.status().as_u16();
    span.record("status", status);
    let latency_ms = latency.as_millis() as u64;
    if res.status().is_server_error() {
        error!(status, latency_ms, "request failed");
    } else {
        debug!(status, latency_ms, "request finished");
    }
}

/// Only the configured front-end origin may call the API from a browser.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(e) => {
            warn!(error = %e, origin, "invalid CORS origin; cross-origin requests disabled");
            layer
        }
    }
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
