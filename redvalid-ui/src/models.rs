//! Backend request/response types and upload view-models
//!
//! Response types are lenient: optional fields default, unknown fields are
//! kept in `extra` so they survive into the upload result.

use crate::selection::SelectedFile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status tag for a record confirmed on chain
pub const STATUS_VERIFIED_ON_STELLAR: &str = "VERIFIED_ON_STELLAR";
/// Status tag for a submitted but unconfirmed transaction
pub const STATUS_PROCESSING_ON_BLOCKCHAIN: &str = "PROCESSING_ON_BLOCKCHAIN";
pub const STATUS_VERIFIED: &str = "VERIFIED";
pub const STATUS_SENDING: &str = "SENDING";
/// File-mode tags
pub const STATUS_ALREADY_EXISTS: &str = "ALREADY_EXISTS";
pub const STATUS_EXISTS_IN_DATABASE: &str = "EXISTS_IN_DATABASE";
pub const STATUS_NOT_FOUND: &str = "NOT_FOUND";

/// Reporter attribution embedded in verification responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReporterSummary {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
}

/// Response from `/verify` and `/verify/file`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub stellar_transaction_id: Option<String>,
    #[serde(default)]
    pub reporter: Option<ReporterSummary>,
    #[serde(default)]
    pub message: Option<String>,
    /// File mode: chain status of the matching record (string or `{status}`)
    #[serde(default)]
    pub blockchain_status: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerificationResponse {
    /// Chain status nested inside a file-mode response
    ///
    /// Accepts `blockchain_status: "TAG"`, `blockchain_status: {status: "TAG"}`
    /// and `blockchain: {status: "TAG"}`.
    pub fn nested_blockchain_status(&self) -> Option<&str> {
        match &self.blockchain_status {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(obj @ Value::Object(_)) => obj.get("status").and_then(Value::as_str),
            _ => self
                .extra
                .get("blockchain")
                .and_then(|b| b.get("status"))
                .and_then(Value::as_str),
        }
    }
}

/// Unsigned transaction returned by the prepare endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparedTransaction {
    #[serde(default)]
    pub video_id: Option<String>,
    /// Kept untyped so a non-string payload is detected rather than rejected by serde
    #[serde(default)]
    pub xdr_for_signing: Option<Value>,
    #[serde(default)]
    pub url_hash: Option<String>,
    #[serde(default)]
    pub data_hash: Option<String>,
    #[serde(default)]
    pub already_registered: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    /// Network the backend built the transaction for
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub network_passphrase: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PreparedTransaction {
    pub fn is_already_registered(&self) -> bool {
        self.already_registered.unwrap_or(false)
    }

    /// The payload to sign, only if it is a non-empty string
    pub fn unsigned_payload(&self) -> Option<&str> {
        match &self.xdr_for_signing {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Response from `/videos/submit-transaction`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, alias = "stellar_tx_hash")]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reporter record from `/reporters/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    pub wallet_address: String,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub kyc_verified: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for `POST /reporters/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReporter {
    pub full_name: String,
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

/// Body for `POST /videos/prepare-transaction`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PrepareUrlRequest<'a> {
    pub reporter_wallet: &'a str,
    pub video_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
}

/// Body for `POST /videos/submit-transaction`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub video_id: &'a str,
    pub signed_xdr: &'a str,
}

/// Body for `POST /verify`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub video_url: &'a str,
}

/// Upload entry mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    #[default]
    Url,
    File,
}

/// What is being registered; exactly one source per attempt
#[derive(Debug, Clone)]
pub enum UploadSource {
    Url(String),
    File(SelectedFile),
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub source: UploadSource,
    pub reporter_name: Option<String>,
}

impl UploadRequest {
    pub fn mode(&self) -> UploadMode {
        match self.source {
            UploadSource::Url(_) => UploadMode::Url,
            UploadSource::File(_) => UploadMode::File,
        }
    }
}

/// View-model for an upload attempt
///
/// Rebuilt from scratch on every attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadResult {
    pub video_id: Option<String>,
    pub url_hash: Option<String>,
    pub data_hash: Option<String>,
    pub tx_hash: Option<String>,
    pub message: Option<String>,
    pub video_url: Option<String>,
    pub file_name: Option<String>,
    pub owner_wallet: String,
    /// Set once the attempt reached a terminal success
    pub signed: bool,
    pub already_registered: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UploadResult {
    pub fn from_prepared(
        prepared: &PreparedTransaction,
        request: &UploadRequest,
        owner_wallet: &str,
    ) -> Self {
        let (video_url, file_name) = match &request.source {
            UploadSource::Url(url) => (Some(url.clone()), None),
            UploadSource::File(file) => (
                prepared
                    .extra
                    .get("video_url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                Some(file.file_name.clone()),
            ),
        };

        let mut extra = prepared.extra.clone();
        extra.remove("video_url");

        Self {
            video_id: prepared.video_id.clone(),
            url_hash: prepared.url_hash.clone(),
            data_hash: prepared.data_hash.clone(),
            tx_hash: None,
            message: prepared.message.clone(),
            video_url,
            file_name,
            owner_wallet: owner_wallet.to_string(),
            signed: false,
            already_registered: prepared.is_already_registered(),
            extra,
        }
    }

    /// Fold submission fields over the prepared ones and mark signed
    pub fn merge_submission(&mut self, submission: SubmitResponse) {
        if submission.tx_hash.is_some() {
            self.tx_hash = submission.tx_hash;
        }
        if submission.message.is_some() {
            self.message = submission.message;
        }
        if let Some(status) = submission.status {
            self.extra.insert("status".to_string(), Value::String(status));
        }
        self.extra.extend(submission.extra);
        self.signed = true;
    }
}
