//! Query view
//!
//! Looks up the verification record for a video URL or a video file and
//! classifies the backend answer into a [`QueryResult`].
//!
//! State machine: `Idle → Querying → Completed | Failed`, re-entering
//! `Querying` on every submit. File selections are checked locally (type and
//! size) and never reach the backend when they fail.

use crate::error::{ClientError, FlowError};
use crate::messages::{
    client_message, user_message, ALREADY_UPLOADED_UNVERIFIED, ENTER_VIDEO_URL, FILE_NOT_FOUND,
    INVALID_VIDEO_URL, NO_VERIFICATION_RECORD, PROCESSING_ON_CHAIN, VERIFICATION_IN_PROGRESS,
    VERIFIED_LOCALLY, VERIFIED_ON_CHAIN, VIDEO_NOT_FOUND,
};
use crate::models::{
    ReporterSummary, VerificationResponse, STATUS_ALREADY_EXISTS, STATUS_EXISTS_IN_DATABASE,
    STATUS_NOT_FOUND, STATUS_PROCESSING_ON_BLOCKCHAIN, STATUS_SENDING, STATUS_VERIFIED,
    STATUS_VERIFIED_ON_STELLAR,
};
use crate::selection::SelectedFile;
use crate::services::BackendApi;
use chrono::Utc;
use redvalid_common::events::{EventBus, RedValidEvent};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Platform label shown for URL results (the backend does not report one)
const UNKNOWN_PLATFORM: &str = "unknown";

/// Visual category of a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    FoundVerified,
    FoundUnverified,
    /// File mode only: uploaded before but never confirmed on chain
    AlreadyUploadedUnverified,
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnerInfo {
    pub wallet_address: Option<String>,
    pub full_name: Option<String>,
}

impl OwnerInfo {
    fn from_summary(summary: &ReporterSummary) -> Option<Self> {
        if summary.wallet_address.is_none() && summary.full_name.is_none() {
            return None;
        }
        Some(Self {
            wallet_address: summary.wallet_address.clone(),
            full_name: summary.full_name.clone(),
        })
    }
}

/// Echo of the queried file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

impl From<&SelectedFile> for FileInfo {
    fn from(file: &SelectedFile) -> Self {
        Self {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
        }
    }
}

/// Display tuple for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub kind: ResultKind,
    pub found: bool,
    pub verified: bool,
    pub message: String,
    pub video_url: Option<String>,
    pub platform: Option<String>,
    pub tx_hash: Option<String>,
    pub owner: Option<OwnerInfo>,
    pub file: Option<FileInfo>,
}

impl QueryResult {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::NotFound,
            found: false,
            verified: false,
            message: message.into(),
            video_url: None,
            platform: None,
            tx_hash: None,
            owner: None,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryState {
    #[default]
    Idle,
    Querying,
    Completed(QueryResult),
    Failed(String),
}

impl QueryState {
    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            QueryState::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Classify a `/verify` answer
pub fn classify_url_response(response: &VerificationResponse, queried_url: &str) -> QueryResult {
    let status = response.status.as_str();
    let video_url = response
        .video_url
        .clone()
        .or_else(|| Some(queried_url.to_string()));
    let owner = response.reporter.as_ref().and_then(OwnerInfo::from_summary);

    match status {
        STATUS_VERIFIED_ON_STELLAR => QueryResult {
            kind: ResultKind::FoundVerified,
            found: true,
            verified: true,
            message: VERIFIED_ON_CHAIN.to_string(),
            video_url,
            platform: Some(UNKNOWN_PLATFORM.to_string()),
            tx_hash: response.stellar_transaction_id.clone(),
            owner,
            file: None,
        },
        STATUS_PROCESSING_ON_BLOCKCHAIN => QueryResult {
            kind: ResultKind::FoundUnverified,
            found: true,
            verified: false,
            message: backend_message(response, PROCESSING_ON_CHAIN),
            video_url,
            platform: Some(UNKNOWN_PLATFORM.to_string()),
            tx_hash: response.stellar_transaction_id.clone(),
            owner,
            file: None,
        },
        STATUS_VERIFIED | STATUS_SENDING => {
            let verified = status == STATUS_VERIFIED;
            QueryResult {
                kind: if verified {
                    ResultKind::FoundVerified
                } else {
                    ResultKind::FoundUnverified
                },
                found: true,
                verified,
                message: if verified {
                    VERIFIED_LOCALLY
                } else {
                    VERIFICATION_IN_PROGRESS
                }
                .to_string(),
                video_url,
                platform: Some(UNKNOWN_PLATFORM.to_string()),
                tx_hash: response.stellar_transaction_id.clone(),
                owner,
                file: None,
            }
        }
        _ => QueryResult::not_found(VIDEO_NOT_FOUND),
    }
}

/// Classify a `/verify/file` answer
pub fn classify_file_response(response: &VerificationResponse, file: &FileInfo) -> QueryResult {
    let owner = response.reporter.as_ref().and_then(OwnerInfo::from_summary);

    match response.status.as_str() {
        STATUS_ALREADY_EXISTS | STATUS_EXISTS_IN_DATABASE => {
            let verified =
                response.nested_blockchain_status() == Some(STATUS_VERIFIED_ON_STELLAR);
            QueryResult {
                kind: if verified {
                    ResultKind::FoundVerified
                } else {
                    ResultKind::AlreadyUploadedUnverified
                },
                found: true,
                verified,
                message: if verified {
                    VERIFIED_ON_CHAIN.to_string()
                } else {
                    backend_message(response, ALREADY_UPLOADED_UNVERIFIED)
                },
                video_url: response.video_url.clone(),
                platform: None,
                tx_hash: response.stellar_transaction_id.clone(),
                owner,
                file: Some(file.clone()),
            }
        }
        STATUS_NOT_FOUND => QueryResult {
            file: Some(file.clone()),
            ..QueryResult::not_found(backend_message(response, FILE_NOT_FOUND))
        },
        _ => QueryResult::not_found(backend_message(response, VIDEO_NOT_FOUND)),
    }
}

fn backend_message(response: &VerificationResponse, fallback: &str) -> String {
    response
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Map a failed query request onto the next state
fn failure_state(err: &ClientError, file: Option<FileInfo>) -> QueryState {
    match err {
        ClientError::NotFound(_) => QueryState::Completed(QueryResult {
            file,
            ..QueryResult::not_found(NO_VERIFICATION_RECORD)
        }),
        ClientError::InvalidInput(_) => QueryState::Failed(
            err.detail()
                .map(str::to_string)
                .unwrap_or_else(|| INVALID_VIDEO_URL.to_string()),
        ),
        other => QueryState::Failed(client_message(other)),
    }
}

/// Verification lookup view
pub struct QueryView {
    api: Arc<dyn BackendApi>,
    max_file_bytes: u64,
    event_bus: Option<EventBus>,
    url_input: String,
    selected_file: Option<FileInfo>,
    auto_run: bool,
    state: QueryState,
}

impl QueryView {
    pub fn new(api: Arc<dyn BackendApi>, max_file_bytes: u64) -> Self {
        Self {
            api,
            max_file_bytes,
            event_bus: None,
            url_input: String::new(),
            selected_file: None,
            auto_run: false,
            state: QueryState::Idle,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Seed the URL input; [`QueryView::enter`] runs the query once
    pub fn with_initial_url(mut self, url: impl Into<String>) -> Self {
        self.url_input = url.into();
        self.auto_run = !self.url_input.trim().is_empty();
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn selected_file(&self) -> Option<&FileInfo> {
        self.selected_file.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, QueryState::Querying)
    }

    pub fn set_url_input(&mut self, url: impl Into<String>) {
        self.url_input = url.into();
    }

    /// Run the seeded query, if any (only on the first call)
    pub async fn enter(&mut self) -> &QueryState {
        if std::mem::take(&mut self.auto_run) {
            debug!(url = %self.url_input, "Running seeded query");
            self.submit_url().await;
        }
        &self.state
    }

    /// Query the current URL input
    pub async fn submit_url(&mut self) -> &QueryState {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            self.state = QueryState::Failed(ENTER_VIDEO_URL.to_string());
            return &self.state;
        }

        self.selected_file = None;
        self.state = QueryState::Querying;

        self.state = match self.api.verify_video(&url).await {
            Ok(response) => {
                let result = classify_url_response(&response, &url);
                info!(url = %url, status = %response.status, found = result.found, "Query completed");
                QueryState::Completed(result)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Query failed");
                failure_state(&e, None)
            }
        };

        self.emit_completion();
        &self.state
    }

    /// Query by file content
    pub async fn submit_file(&mut self, file: SelectedFile) -> &QueryState {
        if let Err(e) = file.validate(self.max_file_bytes) {
            self.selected_file = None;
            self.state = QueryState::Failed(user_message(&e));
            return &self.state;
        }

        let info = FileInfo::from(&file);
        self.selected_file = Some(info.clone());
        self.state = QueryState::Querying;

        self.state = match self.api.verify_file(&file).await {
            Ok(response) => {
                let result = classify_file_response(&response, &info);
                info!(
                    file = %info.file_name,
                    status = %response.status,
                    found = result.found,
                    "File query completed"
                );
                QueryState::Completed(result)
            }
            Err(e) => {
                warn!(file = %info.file_name, error = %e, "File query failed");
                failure_state(&e, Some(info))
            }
        };

        self.emit_completion();
        &self.state
    }

    /// Open `path` and query by its content
    pub async fn submit_file_path(&mut self, path: &Path) -> &QueryState {
        match SelectedFile::open(path, self.max_file_bytes).await {
            Ok(file) => self.submit_file(file).await,
            Err(e) => {
                self.reject_selection(&e);
                &self.state
            }
        }
    }

    fn reject_selection(&mut self, err: &FlowError) {
        self.selected_file = None;
        self.state = QueryState::Failed(user_message(err));
    }

    fn emit_completion(&self) {
        if let (Some(bus), Some(result)) = (&self.event_bus, self.state.result()) {
            bus.emit_lossy(RedValidEvent::QueryCompleted {
                found: result.found,
                verified: result.verified,
                timestamp: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> VerificationResponse {
        serde_json::from_value(value).unwrap()
    }

    fn found_verified(status: &str) -> (bool, bool) {
        let result = classify_url_response(&response(json!({ "status": status })), "u");
        (result.found, result.verified)
    }

    #[test]
    fn test_url_classification_table() {
        assert_eq!(found_verified("VERIFIED_ON_STELLAR"), (true, true));
        assert_eq!(found_verified("PROCESSING_ON_BLOCKCHAIN"), (true, false));
        assert_eq!(found_verified("VERIFIED"), (true, true));
        assert_eq!(found_verified("SENDING"), (true, false));
        assert_eq!(found_verified("FAILED"), (false, false));
        assert_eq!(found_verified("verified_on_stellar"), (false, false));
    }

    #[test]
    fn test_verified_on_stellar_carries_tx_and_owner() {
        let result = classify_url_response(
            &response(json!({
                "status": "VERIFIED_ON_STELLAR",
                "stellar_transaction_id": "txABC",
                "reporter": { "wallet_address": "GADDR", "full_name": "Jane" }
            })),
            "https://youtube.com/watch?v=abc",
        );
        assert_eq!(result.kind, ResultKind::FoundVerified);
        assert_eq!(result.tx_hash.as_deref(), Some("txABC"));
        assert_eq!(result.video_url.as_deref(), Some("https://youtube.com/watch?v=abc"));
        let owner = result.owner.unwrap();
        assert_eq!(owner.wallet_address.as_deref(), Some("GADDR"));
        assert_eq!(owner.full_name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_processing_uses_backend_message() {
        let result = classify_url_response(
            &response(json!({ "status": "PROCESSING_ON_BLOCKCHAIN", "message": "queued" })),
            "u",
        );
        assert_eq!(result.message, "queued");

        let result =
            classify_url_response(&response(json!({ "status": "PROCESSING_ON_BLOCKCHAIN" })), "u");
        assert_eq!(result.message, PROCESSING_ON_CHAIN);
    }

    fn file_info() -> FileInfo {
        FileInfo {
            file_name: "clip.mp4".into(),
            content_type: "video/mp4".into(),
            size: 1024,
        }
    }

    #[test]
    fn test_file_exists_and_verified_on_chain() {
        let result = classify_file_response(
            &response(json!({
                "status": "ALREADY_EXISTS",
                "blockchain_status": { "status": "VERIFIED_ON_STELLAR" }
            })),
            &file_info(),
        );
        assert_eq!(result.kind, ResultKind::FoundVerified);
        assert!(result.verified);
    }

    #[test]
    fn test_file_exists_but_unverified_is_distinct() {
        let result = classify_file_response(
            &response(json!({ "status": "EXISTS_IN_DATABASE", "blockchain_status": "SENDING" })),
            &file_info(),
        );
        assert_eq!(result.kind, ResultKind::AlreadyUploadedUnverified);
        assert!(result.found);
        assert!(!result.verified);
        assert_eq!(result.message, ALREADY_UPLOADED_UNVERIFIED);
    }

    #[test]
    fn test_file_not_found_echoes_metadata() {
        let result =
            classify_file_response(&response(json!({ "status": "NOT_FOUND" })), &file_info());
        assert_eq!(result.kind, ResultKind::NotFound);
        assert_eq!(result.file, Some(file_info()));
        assert_eq!(result.message, FILE_NOT_FOUND);
    }

    #[test]
    fn test_file_unknown_status_uses_backend_message() {
        let result = classify_file_response(
            &response(json!({ "status": "ERROR", "message": "hash mismatch" })),
            &file_info(),
        );
        assert!(!result.found);
        assert_eq!(result.message, "hash mismatch");
        assert_eq!(result.file, None);
    }

    #[test]
    fn test_failure_state_mapping() {
        assert_eq!(
            failure_state(&ClientError::NotFound("Video not found".into()), None)
                .result()
                .map(|r| r.message.clone()),
            Some(NO_VERIFICATION_RECORD.to_string())
        );
        assert_eq!(
            failure_state(&ClientError::InvalidInput("Unsupported platform".into()), None),
            QueryState::Failed("Unsupported platform".into())
        );
        assert_eq!(
            failure_state(&ClientError::InvalidInput(String::new()), None),
            QueryState::Failed(INVALID_VIDEO_URL.into())
        );
        assert_eq!(
            failure_state(&ClientError::Network("refused".into()), None),
            QueryState::Failed(crate::messages::SERVER_UNREACHABLE.into())
        );
    }
}
