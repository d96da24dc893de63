//! HTTP endpoint for the container orchestrator to check that the process is alive.

use crate::prelude::*;
use crate::{MetricsHandle, Result};
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) hostname: String,
    pub(crate) port: u16,
}

/// Binds the listener right away, so that the address conflicts are reported
/// at startup, and serves the requests in the background.
pub(crate) async fn spawn(config: &Config, metrics: MetricsHandle) -> Result<JoinHandle<()>> {
    let addr = (config.hostname.as_str(), config.port);

    let listener = TcpListener::bind(addr)
        .await
        .fatal_ctx(|| format!("Failed to bind the HTTP server to {}:{}", addr.0, addr.1))?;

    info!(hostname = addr.0, port = addr.1, "HTTP server started");

    Ok(tokio::spawn(serve(listener, metrics)))
}

async fn serve(listener: TcpListener, metrics: MetricsHandle) {
    let app = Router::new()
        .route("/metrics", get(render_metrics))
        .fallback(liveness)
        .with_state(metrics);

    if let Err(err) = axum::serve(listener, app).await {
        error!(err = tracing_err(&err), "HTTP server stopped");
    }
}

async fn render_metrics(State(metrics): State<MetricsHandle>) -> String {
    metrics.render()
}

async fn liveness(method: Method, uri: Uri) -> (StatusCode, String) {
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, format!("{method} is not supported"));
    }
    (StatusCode::OK, format!("GET request for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test_log::test(tokio::test)]
    async fn responds_to_any_path() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let recorder = PrometheusBuilder::new().build_recorder();
        let server = tokio::spawn(serve(listener, recorder.handle()));

        let client = reqwest::Client::new();

        let response = client
            .get(format!("http://{addr}/healthz"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "GET request for /healthz");

        let response = client
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let response = client
            .post(format!("http://{addr}/"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

        server.abort();
    }
}
