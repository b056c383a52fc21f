//! Wallet adapter
//!
//! The wallet extension is an external collaborator that owns keys and
//! signing. This module bridges to it through the [`WalletExtension`] trait
//! and normalizes its inconsistent response shapes:
//!
//! - address requests may answer with an address string, the string
//!   `"true"`, an `{address}` object, or an `{error}` object
//! - signing may answer with the signed string or a `{signedTxXdr}` object
//!
//! Whether an extension exists at all is decided once at startup and passed
//! around as a [`WalletCapability`].

pub mod bridge;

pub use bridge::BridgeExtension;

use crate::error::WalletError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// First character of every account ID on the target chain
pub const ACCOUNT_PREFIX: char = 'G';

/// Length of an encoded account ID
pub const ACCOUNT_ID_LEN: usize = 56;

/// Signing parameters passed to the extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOptions {
    /// Short network name (e.g. "testnet")
    pub network: String,
    pub network_passphrase: String,
    /// Account that must sign
    pub account_to_sign: String,
}

/// Raw call surface of a wallet extension
///
/// Implementations return the extension's payloads untouched; the adapter
/// translates them. Errors should already be classified with
/// [`classify_extension_error`].
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Whether the extension is installed and reachable
    async fn is_connected(&self) -> Result<bool, WalletError>;

    /// Interactive address request (may prompt the user)
    async fn request_access(&self) -> Result<Value, WalletError>;

    /// Silent address read (never prompts)
    async fn get_address(&self) -> Result<Value, WalletError>;

    async fn sign_transaction(&self, xdr: &str, options: &SignOptions) -> Result<Value, WalletError>;
}

/// Normalized result of an address request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressPayload {
    /// A usable account address
    Address(String),
    /// Extension acknowledged but did not hand over an address
    Pending,
    /// Extension refused or answered with something unusable
    Failed(String),
}

/// Map any address response shape to an [`AddressPayload`]
pub fn translate_address_payload(payload: &Value) -> AddressPayload {
    match payload {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "true" {
                AddressPayload::Pending
            } else if is_valid_account_id(s) {
                AddressPayload::Address(s.to_string())
            } else {
                AddressPayload::Failed(format!("unexpected address response: {}", s))
            }
        }
        Value::Bool(true) => AddressPayload::Pending,
        Value::Object(map) => {
            if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                return AddressPayload::Failed(error_text(error));
            }
            match map.get("address").and_then(Value::as_str).map(str::trim) {
                Some("") | None => AddressPayload::Pending,
                Some(addr) if has_account_prefix(addr) => AddressPayload::Address(addr.to_string()),
                Some(addr) => {
                    AddressPayload::Failed(format!("unexpected address format: {}", addr))
                }
            }
        }
        other => AddressPayload::Failed(format!("unrecognised address response: {}", other)),
    }
}

/// Pull the signed payload out of a signing response
pub fn translate_signed_payload(payload: &Value) -> Result<String, WalletError> {
    match payload {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::String(_) => Err(WalletError::Extension(
            "wallet returned an empty signature".to_string(),
        )),
        Value::Object(map) => {
            if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                return Err(classify_extension_error(&error_text(error)));
            }
            ["signedTxXdr", "signed_xdr", "signedXdr"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    WalletError::Extension("signing response has no signed payload".to_string())
                })
        }
        other => Err(WalletError::Extension(format!(
            "unrecognised signing response: {}",
            other
        ))),
    }
}

/// Classify free-form extension error text into a [`WalletError`]
pub fn classify_extension_error(text: &str) -> WalletError {
    let lower = text.to_lowercase();
    if ["reject", "declin", "denied", "cancel"]
        .iter()
        .any(|n| lower.contains(n))
    {
        WalletError::UserRejected
    } else if ["invalid xdr", "malformed", "invalid transaction", "xdr decode"]
        .iter()
        .any(|n| lower.contains(n))
    {
        WalletError::InvalidPayload(text.to_string())
    } else if lower.contains("not connected") {
        WalletError::NotConnected
    } else if lower.contains("not installed") {
        WalletError::NotInstalled
    } else {
        WalletError::Extension(text.to_string())
    }
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

pub fn has_account_prefix(address: &str) -> bool {
    address.starts_with(ACCOUNT_PREFIX)
}

/// Full account-ID check: prefix, fixed length, base-32 alphabet (A-Z, 2-7)
pub fn is_valid_account_id(address: &str) -> bool {
    address.len() == ACCOUNT_ID_LEN
        && has_account_prefix(address)
        && address
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}

/// Connected wallet for this session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    address: Option<String>,
}

impl WalletSession {
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    fn establish(&mut self, address: String) {
        self.address = Some(address);
    }

    fn clear(&mut self) {
        self.address = None;
    }
}

/// Whether a wallet extension is available, decided once at startup
#[derive(Clone)]
pub enum WalletCapability {
    Present(Arc<dyn WalletExtension>),
    Absent,
}

impl std::fmt::Debug for WalletCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletCapability::Present(ext) => write!(f, "Present({})", ext.name()),
            WalletCapability::Absent => write!(f, "Absent"),
        }
    }
}

impl WalletCapability {
    /// Build the capability from the configured bridge URL
    pub fn detect(bridge_url: Option<&str>) -> Self {
        match bridge_url {
            Some(url) => match BridgeExtension::new(url) {
                Ok(bridge) => {
                    info!(bridge_url = url, "Wallet bridge configured");
                    WalletCapability::Present(Arc::new(bridge))
                }
                Err(e) => {
                    warn!(bridge_url = url, error = %e, "Wallet bridge unusable, wallet disabled");
                    WalletCapability::Absent
                }
            },
            None => {
                info!("No wallet bridge configured, wallet disabled");
                WalletCapability::Absent
            }
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, WalletCapability::Present(_))
    }
}

/// Session-aware front for a wallet extension
pub struct WalletAdapter {
    capability: WalletCapability,
    session: WalletSession,
}

impl WalletAdapter {
    pub fn new(capability: WalletCapability) -> Self {
        Self {
            capability,
            session: WalletSession::default(),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn capability(&self) -> &WalletCapability {
        &self.capability
    }

    /// Silent reconnect: the connected address, or `None`
    ///
    /// Never fails; every problem is reported as "not connected".
    pub async fn check_connection(&mut self) -> Option<String> {
        let WalletCapability::Present(ext) = &self.capability else {
            return None;
        };

        match ext.is_connected().await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                debug!(wallet = ext.name(), error = %e, "Wallet connection check failed");
                return None;
            }
        }

        let payload = match ext.get_address().await {
            Ok(payload) => payload,
            Err(e) => {
                debug!(wallet = ext.name(), error = %e, "Silent address read failed");
                return None;
            }
        };

        match translate_address_payload(&payload) {
            AddressPayload::Address(address) => {
                info!(wallet = ext.name(), address = %address, "Wallet reconnected");
                self.session.establish(address.clone());
                Some(address)
            }
            AddressPayload::Pending => None,
            AddressPayload::Failed(reason) => {
                debug!(wallet = ext.name(), reason = %reason, "Silent address read unusable");
                None
            }
        }
    }

    /// Interactive connect: prompts the extension for an address
    pub async fn request_address(&mut self) -> Result<String, WalletError> {
        let WalletCapability::Present(ext) = &self.capability else {
            return Err(WalletError::NotInstalled);
        };

        if !ext.is_connected().await? {
            return Err(WalletError::NotInstalled);
        }

        let payload = ext.request_access().await?;
        match translate_address_payload(&payload) {
            AddressPayload::Address(address) => {
                info!(wallet = ext.name(), address = %address, "Wallet connected");
                self.session.establish(address.clone());
                Ok(address)
            }
            AddressPayload::Pending => Err(WalletError::AddressUnavailable),
            AddressPayload::Failed(reason) => match classify_extension_error(&reason) {
                WalletError::Extension(_) => {
                    warn!(wallet = ext.name(), reason = %reason, "Address request unusable");
                    Err(WalletError::AddressUnavailable)
                }
                classified => Err(classified),
            },
        }
    }

    /// Ask the extension to sign `xdr` for `options.account_to_sign`
    pub async fn sign_transaction(
        &self,
        xdr: &str,
        options: &SignOptions,
    ) -> Result<String, WalletError> {
        let WalletCapability::Present(ext) = &self.capability else {
            return Err(WalletError::NotInstalled);
        };
        if xdr.trim().is_empty() {
            return Err(WalletError::InvalidPayload("empty transaction payload".to_string()));
        }

        debug!(
            wallet = ext.name(),
            network = %options.network,
            account = %options.account_to_sign,
            xdr_len = xdr.len(),
            "Requesting signature"
        );

        let payload = ext.sign_transaction(xdr, options).await?;
        let signed = translate_signed_payload(&payload)?;
        info!(wallet = ext.name(), signed_len = signed.len(), "Transaction signed");
        Ok(signed)
    }

    /// Forget the connected address; the extension itself stays authorized
    pub fn disconnect(&mut self) {
        if self.session.is_connected() {
            info!("Wallet session cleared");
        }
        self.session.clear();
    }
}
