//! Provenance backend API client
//!
//! One method per backend endpoint. Each issues exactly one HTTP request and
//! returns the parsed body or a [`ClientError`] carrying the status and the
//! backend's message. No retries, no caching.

use crate::error::{extract_detail, ClientError};
use crate::models::{
    NewReporter, PrepareUrlRequest, PreparedTransaction, ReporterProfile, SubmitRequest,
    SubmitResponse, VerificationResponse, VerifyRequest,
};
use crate::selection::SelectedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("redvalid-ui/", env!("CARGO_PKG_VERSION"));
const FILE_FIELD: &str = "video_file";

/// Backend operations used by the views
///
/// Implemented by [`BackendClient`]; views hold it as `Arc<dyn BackendApi>`.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST /verify`
    async fn verify_video(&self, video_url: &str) -> Result<VerificationResponse, ClientError>;

    /// `POST /verify/file` (multipart)
    async fn verify_file(&self, file: &SelectedFile) -> Result<VerificationResponse, ClientError>;

    /// `POST /videos/prepare-transaction`
    async fn prepare_transaction_from_url(
        &self,
        reporter_wallet: &str,
        video_url: &str,
        full_name: Option<&str>,
    ) -> Result<PreparedTransaction, ClientError>;

    /// `POST /videos/prepare-transaction/upload?reporter_wallet=...` (multipart)
    async fn prepare_transaction_from_file(
        &self,
        reporter_wallet: &str,
        file: &SelectedFile,
    ) -> Result<PreparedTransaction, ClientError>;

    /// `POST /videos/submit-transaction`
    async fn submit_transaction(
        &self,
        video_id: &str,
        signed_xdr: &str,
    ) -> Result<SubmitResponse, ClientError>;

    /// `POST /reporters/`
    async fn create_reporter(&self, reporter: &NewReporter) -> Result<ReporterProfile, ClientError>;

    /// `GET /reporters/{wallet_address}`; [`ClientError::NotFound`] when unregistered
    async fn get_reporter(&self, wallet_address: &str) -> Result<ReporterProfile, ClientError>;
}

/// HTTP client for the provenance backend
#[derive(Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: Url,
    file_timeout: Duration,
}

impl BackendClient {
    /// Create a client for `base_url`
    ///
    /// `file_timeout` bounds the multipart file requests only; JSON requests
    /// have no time bound.
    pub fn new(base_url: &str, file_timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidInput(format!("invalid backend URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidInput(format!(
                "backend URL cannot be used as a base: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            file_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL (a trailing `""` keeps a trailing slash)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn file_part(&self, file: &SelectedFile) -> Result<Part, ClientError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ClientError::UnsupportedMediaType(e.to_string()))
    }

    fn map_send_error(&self, err: reqwest::Error, bound: Option<Duration>) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(bound.unwrap_or_default())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Turn a response into the decoded body or a status-mapped error
async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, ClientError> {
    let status = response.status();

    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or_default();
        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body, reason);
        warn!(
            endpoint,
            status = status.as_u16(),
            detail = %detail,
            "Backend returned error"
        );
        return Err(ClientError::from_status(status.as_u16(), detail));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Parse(format!("{}: {}", endpoint, e)))
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn verify_video(&self, video_url: &str) -> Result<VerificationResponse, ClientError> {
        debug!(video_url, "Querying verification status");

        let response = self
            .http_client
            .post(self.endpoint(&["verify"]))
            .json(&VerifyRequest { video_url })
            .send()
            .await
            .map_err(|e| self.map_send_error(e, None))?;

        let result: VerificationResponse = decode(response, "/verify").await?;
        info!(status = %result.status, "Verification query answered");
        Ok(result)
    }

    async fn verify_file(&self, file: &SelectedFile) -> Result<VerificationResponse, ClientError> {
        debug!(file = %file.file_name, size = file.size(), "Querying verification status by file");

        let form = Form::new().part(FILE_FIELD, self.file_part(file)?);
        let response = self
            .http_client
            .post(self.endpoint(&["verify", "file"]))
            .multipart(form)
            .timeout(self.file_timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, Some(self.file_timeout)))?;

        let result: VerificationResponse = decode(response, "/verify/file").await?;
        info!(status = %result.status, "File verification query answered");
        Ok(result)
    }

    async fn prepare_transaction_from_url(
        &self,
        reporter_wallet: &str,
        video_url: &str,
        full_name: Option<&str>,
    ) -> Result<PreparedTransaction, ClientError> {
        debug!(reporter_wallet, video_url, "Preparing transaction from URL");

        let response = self
            .http_client
            .post(self.endpoint(&["videos", "prepare-transaction"]))
            .json(&PrepareUrlRequest {
                reporter_wallet,
                video_url,
                full_name,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e, None))?;

        let prepared: PreparedTransaction =
            decode(response, "/videos/prepare-transaction").await?;
        info!(
            video_id = ?prepared.video_id,
            already_registered = prepared.is_already_registered(),
            "Transaction prepared"
        );
        Ok(prepared)
    }

    async fn prepare_transaction_from_file(
        &self,
        reporter_wallet: &str,
        file: &SelectedFile,
    ) -> Result<PreparedTransaction, ClientError> {
        debug!(
            reporter_wallet,
            file = %file.file_name,
            size = file.size(),
            "Preparing transaction from file"
        );

        let form = Form::new().part(FILE_FIELD, self.file_part(file)?);
        let response = self
            .http_client
            .post(self.endpoint(&["videos", "prepare-transaction", "upload"]))
            .query(&[("reporter_wallet", reporter_wallet)])
            .multipart(form)
            .timeout(self.file_timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, Some(self.file_timeout)))?;

        let prepared: PreparedTransaction =
            decode(response, "/videos/prepare-transaction/upload").await?;
        info!(
            video_id = ?prepared.video_id,
            data_hash = ?prepared.data_hash,
            already_registered = prepared.is_already_registered(),
            "Transaction prepared from file"
        );
        Ok(prepared)
    }

    async fn submit_transaction(
        &self,
        video_id: &str,
        signed_xdr: &str,
    ) -> Result<SubmitResponse, ClientError> {
        debug!(video_id, signed_len = signed_xdr.len(), "Submitting signed transaction");

        let response = self
            .http_client
            .post(self.endpoint(&["videos", "submit-transaction"]))
            .json(&SubmitRequest {
                video_id,
                signed_xdr,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e, None))?;

        let submitted: SubmitResponse = decode(response, "/videos/submit-transaction").await?;
        info!(video_id, tx_hash = ?submitted.tx_hash, "Transaction submitted");
        Ok(submitted)
    }

    async fn create_reporter(&self, reporter: &NewReporter) -> Result<ReporterProfile, ClientError> {
        debug!(wallet_address = %reporter.wallet_address, "Creating reporter");

        let response = self
            .http_client
            .post(self.endpoint(&["reporters", ""]))
            .json(reporter)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, None))?;

        let profile: ReporterProfile = decode(response, "/reporters/").await?;
        info!(wallet_address = %profile.wallet_address, "Reporter created");
        Ok(profile)
    }

    async fn get_reporter(&self, wallet_address: &str) -> Result<ReporterProfile, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint(&["reporters", wallet_address]))
            .send()
            .await
            .map_err(|e| self.map_send_error(e, None))?;

        decode(response, "/reporters/{wallet_address}").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let client = BackendClient::new("http://127.0.0.1:8000", Duration::from_secs(30)).unwrap();
        assert_eq!(
            client.endpoint(&["videos", "prepare-transaction"]).as_str(),
            "http://127.0.0.1:8000/videos/prepare-transaction"
        );
        assert_eq!(
            client.endpoint(&["reporters", ""]).as_str(),
            "http://127.0.0.1:8000/reporters/"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BackendClient::new("https://example.org/api/", Duration::from_secs(30)).unwrap();
        assert_eq!(
            client.endpoint(&["verify"]).as_str(),
            "https://example.org/api/verify"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(BackendClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(BackendClient::new("mailto:someone@example.org", Duration::from_secs(1)).is_err());
    }
}
