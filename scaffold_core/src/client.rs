//! # API Client
//!
//! Async HTTP client for the two external endpoints:
//!
//! - `POST {base}/api/calculate/scaffolding` with the token in the
//!   `Authorization` header and a flat JSON body
//! - `GET {base}/api/payment/success?userId=..&paymentId=..`
//!
//! Requests are built separately from being sent so their shape can be
//! checked without a server. There are no retries: every failure is
//! reported to the caller once.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, StatusCode};

use crate::api::{CalculationRequest, CalculationResponse, CalculationResult, PaymentTokenResponse};
use crate::config::Config;
use crate::errors::{CalcError, CalcResult};

/// Current application version (from Cargo.toml)
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client for the calculation and payment endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> CalcResult<Self> {
        config.validate()?;

        let builder = Client::builder().user_agent(format!("ScaffoldCalc/{}", CURRENT_VERSION));

        #[cfg(not(target_arch = "wasm32"))]
        let builder = if config.request_timeout_secs > 0 {
            builder.timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        } else {
            builder
        };

        let http = builder.build().map_err(|e| CalcError::Config {
            reason: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(ApiClient { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the calculation request without sending it.
    pub fn build_calculate_request(&self, token: &str, request: &CalculationRequest) -> CalcResult<Request> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CalcError::MissingToken);
        }

        let header = HeaderValue::from_str(token)
            .map_err(|_| CalcError::invalid_input("token", "<hidden>", "токен содержит недопустимые символы"))?;

        self.http
            .post(self.config.calculate_url())
            .header(AUTHORIZATION, header)
            .json(request)
            .build()
            .map_err(|e| CalcError::SerializationError {
                reason: e.to_string(),
            })
    }

    /// Submit a calculation.
    ///
    /// `success: false` envelopes come back as [`CalcError::ServerRejected`],
    /// whatever the HTTP status.
    pub async fn calculate(&self, token: &str, request: &CalculationRequest) -> CalcResult<CalculationResult> {
        let http_request = self.build_calculate_request(token, request)?;
        tracing::info!(
            location = request.location.as_str(),
            fields = request.fields.len(),
            "Submitting calculation"
        );

        let (status, body) = self.execute(http_request).await?;
        let response: CalculationResponse = parse_envelope(status, &body)?;
        let result = response.into_result();

        match &result {
            Ok(r) => tracing::info!(volume = r.volume, "Calculation succeeded"),
            Err(e) => tracing::warn!(code = e.error_code(), "Calculation rejected: {}", e),
        }
        result
    }

    pub fn build_payment_request(&self, user_id: &str, payment_id: &str) -> CalcResult<Request> {
        self.http
            .get(self.config.payment_url())
            .query(&[("userId", user_id), ("paymentId", payment_id)])
            .build()
            .map_err(|e| CalcError::SerializationError {
                reason: e.to_string(),
            })
    }

    /// Exchange a payment redirect for an access token.
    pub async fn exchange_payment(&self, user_id: &str, payment_id: &str) -> CalcResult<String> {
        let http_request = self.build_payment_request(user_id, payment_id)?;
        tracing::info!(user_id, payment_id, "Exchanging payment for access token");

        let outcome = match self.execute(http_request).await {
            Ok((status, body)) => parse_envelope::<PaymentTokenResponse>(status, &body).and_then(|r| r.into_token()),
            Err(e) => Err(e),
        };

        // Every failure of this flow surfaces the same way
        outcome.map_err(|e| match e {
            CalcError::TokenExchangeFailed { .. } => e,
            other => {
                tracing::warn!("Token exchange failed: {}", other);
                CalcError::TokenExchangeFailed {
                    message: crate::api::TOKEN_EXCHANGE_FAILED.to_string(),
                }
            }
        })
    }

    async fn execute(&self, request: Request) -> CalcResult<(StatusCode, String)> {
        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!("Request failed: {}", e);
            CalcError::network(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CalcError::network(e.to_string()))?;
        tracing::debug!(%status, bytes = body.len(), "Response received");
        Ok((status, body))
    }
}

/// Parse a JSON envelope; non-JSON bodies are judged by the status code.
fn parse_envelope<T: serde::de::DeserializeOwned>(status: StatusCode, body: &str) -> CalcResult<T> {
    serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            CalcError::invalid_response(e.to_string())
        } else {
            CalcError::server_rejected(Some(format!("Сервер вернул ошибку {}", status)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::form::Location;

    fn client() -> ApiClient {
        ApiClient::new(Config::default().with_api_base_url("http://calc.test:3001")).unwrap()
    }

    fn outside_request() -> CalculationRequest {
        let mut fields = BTreeMap::new();
        fields.insert("length".to_string(), 10.0);
        fields.insert("height".to_string(), 4.25);
        CalculationRequest {
            location: Location::Outside,
            inside_type: None,
            fields,
        }
    }

    #[test]
    fn test_calculate_request_shape() {
        let request = client().build_calculate_request("tok-1", &outside_request()).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://calc.test:3001/api/calculate/scaffolding");
        assert_eq!(request.headers()[AUTHORIZATION], "tok-1");
        assert_eq!(request.headers()[reqwest::header::CONTENT_TYPE], "application/json");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "location": "outside", "length": 10.0, "height": 4.25 })
        );
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_empty_token_builds_no_request() {
        let err = client().build_calculate_request("  ", &outside_request()).unwrap_err();
        assert_eq!(err, CalcError::MissingToken);
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let err = client().build_calculate_request("abc\ndef", &outside_request()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_payment_request_shape() {
        let request = client().build_payment_request("42", "pay 7").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://calc.test:3001/api/payment/success?userId=42&paymentId=pay+7"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = ApiClient::new(Config::default().with_api_base_url("not a url")).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_envelope_parsing_by_status() {
        let rejected: CalcResult<CalculationResponse> =
            parse_envelope(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
        assert_eq!(rejected.unwrap_err().error_code(), "SERVER_REJECTED");

        let garbled: CalcResult<CalculationResponse> = parse_envelope(StatusCode::OK, "oops");
        assert_eq!(garbled.unwrap_err().error_code(), "INVALID_RESPONSE");

        let json_error: CalculationResponse =
            parse_envelope(StatusCode::UNAUTHORIZED, r#"{"success":false,"message":"token expired"}"#).unwrap();
        assert!(json_error.into_result().unwrap_err().is_token_expiry());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = ApiClient::new(Config::default().with_api_base_url("http://127.0.0.1:9")).unwrap();
        let err = client.calculate("tok", &outside_request()).await.unwrap_err();
        assert_eq!(err.error_code(), "NETWORK");
        assert_eq!(err.user_message(), "Не удалось связаться с сервером.");
    }

    #[tokio::test]
    async fn test_unreachable_payment_server_is_exchange_failure() {
        let client = ApiClient::new(Config::default().with_api_base_url("http://127.0.0.1:9")).unwrap();
        let err = client.exchange_payment("42", "p-9").await.unwrap_err();
        assert_eq!(
            err,
            CalcError::TokenExchangeFailed {
                message: crate::api::TOKEN_EXCHANGE_FAILED.to_string(),
            }
        );
        assert!(!err.is_token_expiry());
    }
}
