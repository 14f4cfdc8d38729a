//! API gateway client for the insight backend.
//!
//! `POST {endpoint}` with header `x-api-key` and body `{"zip_code": "..."}`.
//! On failure the backend answers `{"error": "..."}`.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use zip_map_census_models::ZipCode;

use crate::{DEFAULT_GATEWAY_ERROR, GatewayResponse, InsightError};

/// Gateway client.
#[derive(Debug, Clone)]
pub struct InsightClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct InsightRequest<'a> {
    zip_code: &'a str,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: Option<String>,
}

impl InsightClient {
    /// Creates a gateway client.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: String, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Requests the profile and doppelgangers for `zip`.
    ///
    /// If `cancel` fires first, the in-flight request is dropped (which
    /// aborts the connection) and [`InsightError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// * [`InsightError::Cancelled`] if `cancel` fired
    /// * [`InsightError::Gateway`] on a non-success status, carrying the
    ///   backend's `error` message
    /// * [`InsightError::Http`] / [`InsightError::Json`] on transport or
    ///   parsing failures
    pub async fn fetch_insights(
        &self,
        zip: &ZipCode,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, InsightError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::info!("Insight request for {zip} was cancelled");
                Err(InsightError::Cancelled)
            }
            result = self.send(zip) => result,
        }
    }

    async fn send(&self, zip: &ZipCode) -> Result<GatewayResponse, InsightError> {
        log::info!("Requesting insights for ZIP {zip}");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(&InsightRequest {
                zip_code: zip.as_str(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GatewayErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_GATEWAY_ERROR.to_string());
            log::warn!("Insight gateway returned {status} for {zip}: {message}");
            return Err(InsightError::Gateway { status, message });
        }

        let response: GatewayResponse = serde_json::from_str(&body)?;

        log::info!(
            "Received insights for {zip} with {} doppelganger(s)",
            response.doppelgangers.len()
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn zip() -> ZipCode {
        ZipCode::parse("94043").unwrap()
    }

    fn client(server: &MockServer) -> InsightClient {
        InsightClient::new(reqwest::Client::new(), server.uri(), "gateway-key".to_string())
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "profile": {
                "whoAreWe": "Tech workers and families.",
                "ourNeighborhood": ["Parks"],
                "socioeconomicTraits": ["High income"]
            },
            "doppelgangers": [{
                "zipCode": "98052",
                "city": "Redmond",
                "state": "WA",
                "similarityReason": "Tech hub",
                "similarityPercentage": 88.0
            }]
        })
    }

    #[tokio::test]
    async fn posts_zip_with_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("x-api-key", "gateway-key"))
            .and(body_json(serde_json::json!({ "zip_code": "94043" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .fetch_insights(&zip(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.profile.who_are_we, "Tech workers and families.");
        assert_eq!(response.doppelgangers[0].city, "Redmond");
    }

    #[tokio::test]
    async fn gateway_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "ZIP not found" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_insights(&zip(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "ZIP not found");
    }

    #[tokio::test]
    async fn gateway_error_without_message_uses_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_insights(&zip(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, InsightError::Gateway { status, .. } if status.as_u16() == 502));
        assert_eq!(err.to_string(), DEFAULT_GATEWAY_ERROR);
    }

    #[tokio::test]
    async fn cancelling_aborts_slow_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body())
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = client(&server).fetch_insights(&zip(), &token).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_token_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(0)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        token.cancel();

        let err = client(&server).fetch_insights(&zip(), &token).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
