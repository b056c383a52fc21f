//! HTTP wallet bridge
//!
//! Talks to a local bridge process that relays calls to the wallet
//! extension:
//!
//! - `GET  /is-connected`     → `{"isConnected": bool}` or a bare bool
//! - `POST /request-access`   → address payload (any shape)
//! - `GET  /address`          → address payload (any shape)
//! - `POST /sign-transaction` → signed payload (any shape)
//!
//! Signing waits on the user, so requests carry no overall timeout. Only the
//! connect phase is bounded.

use super::{classify_extension_error, SignOptions, WalletExtension};
use crate::error::{extract_detail, WalletError};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    xdr: &'a str,
    #[serde(flatten)]
    options: &'a SignOptions,
}

/// Wallet extension reached through an HTTP bridge
pub struct BridgeExtension {
    http_client: reqwest::Client,
    base_url: Url,
}

impl BridgeExtension {
    pub fn new(base_url: &str) -> Result<Self, WalletError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WalletError::Extension(format!("invalid bridge URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WalletError::Extension(format!(
                "bridge URL cannot be used as a base: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WalletError::Extension(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(segment);
        }
        url
    }

    fn map_send_error(err: reqwest::Error) -> WalletError {
        debug!(error = %err, "Wallet bridge unreachable");
        WalletError::NotInstalled
    }

    async fn read_payload(response: Response, endpoint: &str) -> Result<Value, WalletError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::Extension(format!("{}: {}", endpoint, e)))?;

        if !status.is_success() {
            let detail = extract_detail(&body, status.canonical_reason().unwrap_or_default());
            warn!(endpoint, status = status.as_u16(), detail = %detail, "Wallet bridge error");
            return Err(classify_extension_error(&detail));
        }

        if body.trim().is_empty() {
            return Ok(Value::String(String::new()));
        }
        // Bridges may answer with a bare string instead of JSON
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

#[async_trait]
impl WalletExtension for BridgeExtension {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn is_connected(&self) -> Result<bool, WalletError> {
        let response = self
            .http_client
            .get(self.endpoint("is-connected"))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let payload = Self::read_payload(response, "/is-connected").await?;
        Ok(match &payload {
            Value::Bool(b) => *b,
            Value::Object(map) => map
                .get("isConnected")
                .or_else(|| map.get("is_connected"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Value::String(s) => s.trim() == "true",
            _ => false,
        })
    }

    async fn request_access(&self) -> Result<Value, WalletError> {
        let response = self
            .http_client
            .post(self.endpoint("request-access"))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::read_payload(response, "/request-access").await
    }

    async fn get_address(&self) -> Result<Value, WalletError> {
        let response = self
            .http_client
            .get(self.endpoint("address"))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::read_payload(response, "/address").await
    }

    async fn sign_transaction(&self, xdr: &str, options: &SignOptions) -> Result<Value, WalletError> {
        let response = self
            .http_client
            .post(self.endpoint("sign-transaction"))
            .json(&SignRequest { xdr, options })
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::read_payload(response, "/sign-transaction").await
    }
}
