use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

pub(crate) type Client = reqwest_middleware::ClientWithMiddleware;

/// Upper bound for a single request including reading the body
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(
    "PitwallTelegramBot/",
    env!("CARGO_PKG_VERSION"),
);

/// Creates a client that makes a single attempt per request. Failed commands
/// are repeated by the users themselves.
pub(crate) fn create_client() -> Result<Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .fatal_ctx(|| "Failed to build the HTTP client")?;

    Ok(reqwest_middleware::ClientBuilder::new(client)
        .with(ObservingMiddleware)
        .build())
}

struct ObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for ObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut ::http::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let span = info_span!(
            "request",
            version = ?request.version(),
            method = %request.method(),
            path = request.url().path(),
        );

        let method = request.method().to_string();
        let host = request.url().host_str().unwrap_or("{unknown}").to_owned();

        async move {
            let (result, duration) = next.run(request, extensions).with_duration().await;

            let status = match &result {
                Ok(response) => response.status().as_u16().to_string(),
                Err(_) => "{fatal}".to_owned(),
            };

            metrics::histogram!(
                "http_request_duration_seconds",
                "method" => method,
                "host" => host,
                "status" => status,
            )
            .record(duration);

            let duration = tracing_duration(duration);

            let response = match &result {
                Ok(response) => response,
                Err(err) => {
                    error!(duration, err = tracing_err(err), "Network request failed");
                    return result;
                }
            };

            let status = response.status();

            if status.is_success() {
                info!(duration, %status, "Network request succeeded");
            } else {
                warn!(duration, %status, "Network request failed (error status)");
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Errors at the layer of the HTTP API
#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpClientError {
    #[error("HTTP request failed")]
    Request { source: reqwest_middleware::Error },

    #[error("Failed to read HTTP response")]
    ReadPayload { source: reqwest::Error },

    #[error("HTTP request has failed (HTTP status code: {status}):\n{body}")]
    BadResponseStatusCode {
        status: reqwest::StatusCode,
        body: String,
    },
}
