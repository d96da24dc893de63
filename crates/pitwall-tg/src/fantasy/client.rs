use super::DecodeError;
use crate::error::{err, err_ctx};
use crate::http::{self, HttpClientError};
use crate::prelude::*;
use crate::Result;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use session_capture::SessionCookie;
use url::Url;

/// Makes requests to the Fantasy API on behalf of the signed in user
#[derive(Clone)]
pub(crate) struct FantasyClient {
    http: http::Client,
    base_url: Url,
    cookie: HeaderValue,
}

impl FantasyClient {
    pub(crate) fn new(http: http::Client, base_url: Url, cookie: &SessionCookie) -> Result<Self> {
        let mut cookie = HeaderValue::from_str(cookie.as_str())
            .fatal_ctx(|| "Session cookie is not a valid header value")?;

        cookie.set_sensitive(true);

        Ok(Self {
            http,
            base_url,
            cookie,
        })
    }

    /// Makes a single request and decodes the body with the given `decode`
    /// function. Only `200 OK` is considered a success, the body of any other
    /// response is returned in the error.
    pub(crate) async fn request<T>(
        &self,
        method: Method,
        path: &str,
        mut headers: HeaderMap,
        decode: impl FnOnce(&[u8]) -> Result<T, DecodeError>,
    ) -> Result<T> {
        headers.insert(header::COOKIE, self.cookie.clone());

        let url = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .send()
            .await
            .map_err(err_ctx!(HttpClientError::Request))?;

        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_else(|err| {
                format!(
                    "Could not collect the error response body text: {}",
                    err.display_chain()
                )
            });

            return Err(err!(HttpClientError::BadResponseStatusCode { status, body }));
        }

        let body = response
            .bytes()
            .await
            .map_err(err_ctx!(HttpClientError::ReadPayload))?;

        decode(&body).map_err(|err| {
            warn!(path, "Bad response body");
            err.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> FantasyClient {
        FantasyClient::new(
            http::create_client().unwrap(),
            server.base_url().parse().unwrap(),
            &SessionCookie::new("sid=ABC123"),
        )
        .unwrap()
    }

    fn utf8(body: &[u8]) -> Result<String, DecodeError> {
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    #[test_log::test(tokio::test)]
    async fn sends_the_session_cookie() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/f1/2022/leaderboards/leagues")
                    .query_param("league_id", "42")
                    .header("cookie", "sid=ABC123")
                    .header("x-extra", "yes");
                then.status(200).body("standing");
            })
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-extra", HeaderValue::from_static("yes"));

        let body = client(&server)
            .request(
                Method::GET,
                "/f1/2022/leaderboards/leagues?v=1&league_id=42",
                headers,
                utf8,
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "standing");
    }

    #[test_log::test(tokio::test)]
    async fn non_ok_status_is_an_error_with_body() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/feeds/schedule/raceday_en.json");
                then.status(401).body(r#"{"message":"session expired"}"#);
            })
            .await;

        let err = client(&server)
            .request(
                Method::GET,
                "/feeds/schedule/raceday_en.json",
                HeaderMap::new(),
                utf8,
            )
            .await
            .unwrap_err();

        let crate::error::ErrorKind::HttpClient { source } = err.kind() else {
            panic!("Unexpected error: {err:?}");
        };

        expect_test::expect![[r#"
            HTTP request has failed (HTTP status code: 401 Unauthorized):
            {"message":"session expired"}"#]]
        .assert_eq(&source.to_string());
    }

    #[test_log::test(tokio::test)]
    async fn other_success_statuses_are_not_accepted() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/feeds/drivers/1_en.json");
                then.status(204);
            })
            .await;

        let result = client(&server)
            .request(Method::GET, "/feeds/drivers/1_en.json", HeaderMap::new(), utf8)
            .await;

        assert!(result.is_err());
    }
}
