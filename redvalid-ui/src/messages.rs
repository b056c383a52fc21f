//! User-facing message catalog
//!
//! Views never show raw error text directly. [`user_message`] checks the
//! error text against a fixed substring table first, then falls back to a
//! per-variant message, then to [`GENERIC_FAILURE`].

use crate::error::{ClientError, FlowError, WalletError};

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const USER_REJECTED: &str = "The request was cancelled in the wallet.";
pub const EXTENSION_FAULT: &str =
    "The wallet extension ran into an internal error. Reload the extension and try again.";
pub const WALLET_DISCONNECTED: &str =
    "The wallet is not connected. Connect your wallet and try again.";
pub const WALLET_NOT_INSTALLED: &str =
    "No wallet extension was found. Install and unlock the wallet, then try again.";
pub const WALLET_ADDRESS_UNAVAILABLE: &str =
    "The wallet did not share an address. Approve the connection request and try again.";
pub const WALLET_INVALID_PAYLOAD: &str =
    "The wallet could not read the transaction. Start the upload again.";
pub const SERVER_UNREACHABLE: &str =
    "Could not reach the server. Make sure the backend service is running.";
pub const SERVER_TIMEOUT: &str = "The server took too long to respond. Please try again.";
pub const INCOMPLETE_TRANSACTION: &str =
    "The server returned an incomplete transaction, so nothing was signed.";

pub const ENTER_VIDEO_URL: &str = "Please enter a video URL.";
pub const SELECT_VIDEO_FILE: &str = "Please select a video file.";
pub const ENTER_FULL_NAME: &str = "Please enter your full name.";
pub const CONNECT_WALLET_FIRST: &str = "Please connect your wallet first.";
pub const REGISTER_BEFORE_UPLOAD: &str = "Register your name before uploading a video.";
pub const INVALID_VIDEO_URL: &str = "Invalid video URL.";

pub const VERIFIED_ON_CHAIN: &str = "Video is verified on the Stellar blockchain.";
pub const PROCESSING_ON_CHAIN: &str = "Video is being processed on the blockchain.";
pub const VERIFIED_LOCALLY: &str = "Video is verified.";
pub const VERIFICATION_IN_PROGRESS: &str = "Video verification is in progress.";
pub const VIDEO_NOT_FOUND: &str = "Video not found.";
pub const NO_VERIFICATION_RECORD: &str = "No verification record was found for this video.";
pub const FILE_NOT_FOUND: &str = "No record was found for this file.";
pub const ALREADY_UPLOADED_UNVERIFIED: &str =
    "This video was already uploaded but is not verified on the blockchain yet.";
pub const ALREADY_REGISTERED: &str = "This video is already registered.";

/// Substrings that identify a known failure regardless of where it surfaced
///
/// Matched case-insensitively, in order.
const KNOWN_FAILURES: &[(&[&str], &str)] = &[
    (
        &["user rejected", "user declined", "rejected by user", "user denied"],
        USER_REJECTED,
    ),
    (
        &["internal error", "extension error"],
        EXTENSION_FAULT,
    ),
    (
        &["not connected", "disconnected"],
        WALLET_DISCONNECTED,
    ),
];

/// Message for a known failure substring, if the text contains one
pub fn match_known_failure(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KNOWN_FAILURES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, message)| *message)
}

/// The single message shown for a failed view operation
pub fn user_message(err: &FlowError) -> String {
    if let Some(known) = match_known_failure(&err.to_string()) {
        return known.to_string();
    }

    match err {
        FlowError::Validation(msg) => msg.clone(),
        FlowError::DataIntegrity(_) => INCOMPLETE_TRANSACTION.to_string(),
        FlowError::Client(client) => client_message(client),
        FlowError::Wallet(wallet) => wallet_message(wallet).to_string(),
    }
}

/// Message for a backend client failure
pub fn client_message(err: &ClientError) -> String {
    match err {
        ClientError::Network(_) => SERVER_UNREACHABLE.to_string(),
        ClientError::Timeout(_) => SERVER_TIMEOUT.to_string(),
        other => other
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    }
}

/// Message for a wallet failure
pub fn wallet_message(err: &WalletError) -> &'static str {
    match err {
        WalletError::NotInstalled => WALLET_NOT_INSTALLED,
        WalletError::NotConnected => WALLET_DISCONNECTED,
        WalletError::UserRejected => USER_REJECTED,
        WalletError::InvalidPayload(_) => WALLET_INVALID_PAYLOAD,
        WalletError::AddressUnavailable => WALLET_ADDRESS_UNAVAILABLE,
        WalletError::Extension(_) => EXTENSION_FAULT,
    }
}
