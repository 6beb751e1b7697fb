//! HTTP client for the PixUp Pix API.
//!
//! Each charge performs an OAuth client-credentials exchange followed by
//! `POST /charges`. Tokens are not cached; deposit traffic is low and the
//! sandbox issues short-lived tokens.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::{ChargeReceipt, ChargeRequest, PaymentProvider};
use crate::error::GatewayError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// PixUp API client.
#[derive(Debug, Clone)]
pub struct PixupClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl PixupClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// Every provider call, including the token exchange, fails with
    /// [`GatewayError::PaymentProvider`] once `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Internal(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Returns `true` if both credentials are set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::PaymentNotConfigured);
        }
        let response = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(provider_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::PaymentProvider(format!(
                "token request failed ({status}): {body}"
            )));
        }
        let token: TokenResponse = response.json().await.map_err(provider_error)?;
        Ok(token.access_token)
    }

    async fn open_charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}/charges", self.base_url))
            .bearer_auth(token)
            .json(&json!({
                "amount": request.amount.to_decimal(),
                "description": request.description,
                "callback_url": request.callback_url,
            }))
            .send()
            .await
            .map_err(provider_error)?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(provider_error)?;
        if !status.is_success() {
            return Err(GatewayError::PaymentProvider(format!(
                "create charge failed ({status}): {body}"
            )));
        }
        let receipt = ChargeReceipt::from_raw(body)?;
        tracing::info!(charge_id = %receipt.charge_id, amount = %request.amount, "pix charge opened");
        Ok(receipt)
    }
}

impl PaymentProvider for PixupClient {
    fn create_charge<'a>(
        &'a self,
        request: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeReceipt, GatewayError>> {
        Box::pin(self.open_charge(request))
    }
}

fn provider_error(err: reqwest::Error) -> GatewayError {
    GatewayError::PaymentProvider(err.to_string())
}
