//! Upload view
//!
//! Drives one registration attempt through its phases:
//!
//! 1. connect the wallet (silent reconnect once on mount, explicit connect any time)
//! 2. register the reporter when the wallet has no profile yet
//! 3. prepare the transaction from a URL or a file
//! 4. stop early when the backend already knows the video
//! 5. check the prepared payload before the wallet sees it
//! 6. sign with the wallet
//! 7. submit and merge the submission into the result
//!
//! Exactly one phase (or none) is active at a time. Any failure clears the
//! phase, ends the attempt and leaves a single user-facing message. Nothing
//! is retried.

use crate::error::{ClientError, FlowError, FlowResult};
use crate::messages::{
    user_message, ALREADY_REGISTERED, CONNECT_WALLET_FIRST, ENTER_FULL_NAME, ENTER_VIDEO_URL,
    REGISTER_BEFORE_UPLOAD, SELECT_VIDEO_FILE,
};
use crate::models::{
    NewReporter, ReporterProfile, UploadMode, UploadRequest, UploadResult, UploadSource,
};
use crate::selection::SelectedFile;
use crate::services::BackendApi;
use crate::wallet::{SignOptions, WalletAdapter};
use chrono::Utc;
use redvalid_common::config::NetworkIdentity;
use redvalid_common::events::{EventBus, RedValidEvent, UploadPhase};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Whether the connected wallet has a reporter profile
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReporterStatus {
    /// Not looked up yet, or the lookup failed
    #[default]
    Unknown,
    Registered(ReporterProfile),
    /// Backend has no profile for this wallet
    Missing,
}

impl ReporterStatus {
    pub fn profile(&self) -> Option<&ReporterProfile> {
        match self {
            ReporterStatus::Registered(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Wallet-backed video registration view
pub struct UploadView {
    api: Arc<dyn BackendApi>,
    wallet: WalletAdapter,
    network: NetworkIdentity,
    max_file_bytes: u64,
    event_bus: Option<EventBus>,

    reporter: ReporterStatus,
    mode: UploadMode,
    video_url: String,
    file: Option<SelectedFile>,

    phase: Option<UploadPhase>,
    result: Option<UploadResult>,
    error: Option<String>,
    mounted: bool,
}

impl UploadView {
    pub fn new(
        api: Arc<dyn BackendApi>,
        wallet: WalletAdapter,
        network: NetworkIdentity,
        max_file_bytes: u64,
    ) -> Self {
        Self {
            api,
            wallet,
            network,
            max_file_bytes,
            event_bus: None,
            reporter: ReporterStatus::Unknown,
            mode: UploadMode::Url,
            video_url: String::new(),
            file: None,
            phase: None,
            result: None,
            error: None,
            mounted: false,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.session().address()
    }

    pub fn reporter(&self) -> &ReporterStatus {
        &self.reporter
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn phase(&self) -> Option<UploadPhase> {
        self.phase
    }

    pub fn result(&self) -> Option<&UploadResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Trigger controls stay disabled while a phase is active
    pub fn is_busy(&self) -> bool {
        self.phase.is_some()
    }

    /// First display: try a silent reconnect (only once per view)
    pub async fn mount(&mut self) -> Option<String> {
        if std::mem::replace(&mut self.mounted, true) {
            return self.wallet_address().map(str::to_string);
        }

        let address = self.wallet.check_connection().await?;
        self.emit(RedValidEvent::WalletConnected {
            address: address.clone(),
            timestamp: Utc::now(),
        });

        if let Err(e) = self.load_reporter(&address).await {
            warn!(wallet = %address, error = %e, "Reporter lookup failed after reconnect");
        }
        Some(address)
    }

    /// Explicit connect: prompts the wallet for an address
    pub async fn connect(&mut self) -> FlowResult<String> {
        self.error = None;
        let attempt_id = Uuid::new_v4();
        self.set_phase(attempt_id, Some(UploadPhase::Loading));

        let outcome = self.connect_inner().await;
        self.set_phase(attempt_id, None);
        outcome.map_err(|e| self.fail(e))
    }

    async fn connect_inner(&mut self) -> FlowResult<String> {
        let address = self.wallet.request_address().await?;
        self.emit(RedValidEvent::WalletConnected {
            address: address.clone(),
            timestamp: Utc::now(),
        });
        self.reporter = ReporterStatus::Unknown;
        // The wallet is connected either way; upload retries the lookup
        if let Err(e) = self.load_reporter(&address).await {
            warn!(wallet = %address, error = %e, "Reporter lookup failed after connect");
        }
        Ok(address)
    }

    /// Forget the wallet locally and reset everything tied to it
    pub fn disconnect(&mut self) {
        let was_connected = self.wallet.session().is_connected();
        self.wallet.disconnect();
        self.reporter = ReporterStatus::Unknown;
        self.result = None;
        self.error = None;
        if was_connected {
            self.emit(RedValidEvent::WalletDisconnected {
                timestamp: Utc::now(),
            });
        }
    }

    /// Create the reporter profile for the connected wallet
    pub async fn register(
        &mut self,
        full_name: &str,
        institution: Option<&str>,
    ) -> FlowResult<ReporterProfile> {
        self.error = None;
        let attempt_id = Uuid::new_v4();
        let outcome = self.register_inner(attempt_id, full_name, institution).await;
        self.set_phase(attempt_id, None);
        outcome.map_err(|e| self.fail(e))
    }

    async fn register_inner(
        &mut self,
        attempt_id: Uuid,
        full_name: &str,
        institution: Option<&str>,
    ) -> FlowResult<ReporterProfile> {
        let wallet_address = self
            .wallet_address()
            .map(str::to_string)
            .ok_or_else(|| FlowError::Validation(CONNECT_WALLET_FIRST.to_string()))?;

        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(FlowError::Validation(ENTER_FULL_NAME.to_string()));
        }

        self.set_phase(attempt_id, Some(UploadPhase::Registering));

        let reporter = NewReporter {
            full_name: full_name.to_string(),
            wallet_address: wallet_address.clone(),
            institution: institution
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_string),
        };

        let profile = match self.api.create_reporter(&reporter).await {
            Ok(profile) => profile,
            // Backend refuses duplicates with 400; adopt the existing record
            Err(ClientError::InvalidInput(detail)) => {
                debug!(wallet = %wallet_address, detail = %detail, "Create refused, checking existing profile");
                match self.api.get_reporter(&wallet_address).await {
                    Ok(existing) => existing,
                    Err(_) => return Err(ClientError::InvalidInput(detail).into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        info!(wallet = %wallet_address, name = %profile.full_name, "Reporter registered");
        self.reporter = ReporterStatus::Registered(profile.clone());
        self.emit(RedValidEvent::ReporterRegistered {
            wallet_address,
            timestamp: Utc::now(),
        });
        Ok(profile)
    }

    pub fn set_mode(&mut self, mode: UploadMode) {
        self.mode = mode;
    }

    pub fn set_video_url(&mut self, url: impl Into<String>) {
        self.video_url = url.into();
    }

    /// Pick a file for file mode; rejected selections leave no file selected
    pub fn select_file(&mut self, file: SelectedFile) -> FlowResult<()> {
        match file.validate(self.max_file_bytes) {
            Ok(()) => {
                self.error = None;
                self.file = Some(file);
                Ok(())
            }
            Err(e) => {
                self.file = None;
                Err(self.fail(e))
            }
        }
    }

    pub async fn select_file_path(&mut self, path: &Path) -> FlowResult<()> {
        match SelectedFile::open(path, self.max_file_bytes).await {
            Ok(file) => self.select_file(file),
            Err(e) => {
                self.file = None;
                Err(self.fail(e))
            }
        }
    }

    /// Run one upload attempt from prepare to submit
    pub async fn upload(&mut self) -> FlowResult<UploadResult> {
        let attempt_id = Uuid::new_v4();
        self.error = None;
        self.result = None;

        let outcome = self.run_attempt(attempt_id).await;
        self.set_phase(attempt_id, None);

        match outcome {
            Ok(result) => {
                info!(
                    %attempt_id,
                    video_id = ?result.video_id,
                    tx_hash = ?result.tx_hash,
                    already_registered = result.already_registered,
                    "Upload completed"
                );
                self.emit(RedValidEvent::UploadCompleted {
                    attempt_id,
                    already_registered: result.already_registered,
                    tx_hash: result.tx_hash.clone(),
                    timestamp: Utc::now(),
                });
                self.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                self.result = None;
                let err = self.fail(e);
                if let Some(message) = &self.error {
                    self.emit(RedValidEvent::UploadFailed {
                        attempt_id,
                        message: message.clone(),
                        timestamp: Utc::now(),
                    });
                }
                Err(err)
            }
        }
    }

    async fn run_attempt(&mut self, attempt_id: Uuid) -> FlowResult<UploadResult> {
        let owner = self
            .wallet_address()
            .map(str::to_string)
            .ok_or_else(|| FlowError::Validation(CONNECT_WALLET_FIRST.to_string()))?;
        let source = self.current_source()?;
        let reporter_name = self.ensure_registered(&owner).await?;
        let request = UploadRequest {
            source,
            reporter_name: Some(reporter_name),
        };

        self.set_phase(attempt_id, Some(UploadPhase::Preparing));
        let prepared = match &request.source {
            UploadSource::Url(url) => {
                self.api
                    .prepare_transaction_from_url(&owner, url, request.reporter_name.as_deref())
                    .await?
            }
            UploadSource::File(file) => self.api.prepare_transaction_from_file(&owner, file).await?,
        };

        let mut result = UploadResult::from_prepared(&prepared, &request, &owner);

        if prepared.is_already_registered() {
            info!(%attempt_id, video_id = ?prepared.video_id, "Video already registered, skipping signature");
            result.signed = true;
            result.already_registered = true;
            if result.message.is_none() {
                result.message = Some(ALREADY_REGISTERED.to_string());
            }
            return Ok(result);
        }

        let xdr = prepared
            .unsigned_payload()
            .ok_or_else(|| {
                FlowError::DataIntegrity("prepared transaction has no signable payload".to_string())
            })?
            .to_string();
        let video_id = prepared
            .video_id()
            .ok_or_else(|| FlowError::DataIntegrity("prepared transaction has no video id".to_string()))?
            .to_string();

        // Visible while the wallet prompt is open
        self.result = Some(result.clone());

        self.set_phase(attempt_id, Some(UploadPhase::Signing));
        let options = SignOptions {
            network: prepared
                .network
                .clone()
                .unwrap_or_else(|| self.network.name.clone()),
            network_passphrase: prepared
                .network_passphrase
                .clone()
                .unwrap_or_else(|| self.network.passphrase.clone()),
            account_to_sign: owner.clone(),
        };
        let signed_xdr = self.wallet.sign_transaction(&xdr, &options).await?;

        self.set_phase(attempt_id, Some(UploadPhase::Loading));
        let submission = self.api.submit_transaction(&video_id, &signed_xdr).await?;
        result.merge_submission(submission);
        Ok(result)
    }

    /// The source for the selected mode; exactly one is sent per attempt
    fn current_source(&self) -> FlowResult<UploadSource> {
        match self.mode {
            UploadMode::Url => {
                let url = self.video_url.trim();
                if url.is_empty() {
                    return Err(FlowError::Validation(ENTER_VIDEO_URL.to_string()));
                }
                Ok(UploadSource::Url(url.to_string()))
            }
            UploadMode::File => {
                let file = self
                    .file
                    .as_ref()
                    .ok_or_else(|| FlowError::Validation(SELECT_VIDEO_FILE.to_string()))?;
                file.validate(self.max_file_bytes)?;
                Ok(UploadSource::File(file.clone()))
            }
        }
    }

    /// Reporter name for the connected wallet, or a validation error
    async fn ensure_registered(&mut self, wallet_address: &str) -> FlowResult<String> {
        if self.reporter == ReporterStatus::Unknown {
            self.load_reporter(wallet_address).await?;
        }
        match &self.reporter {
            ReporterStatus::Registered(profile) => Ok(profile.full_name.clone()),
            _ => Err(FlowError::Validation(REGISTER_BEFORE_UPLOAD.to_string())),
        }
    }

    async fn load_reporter(&mut self, wallet_address: &str) -> Result<(), ClientError> {
        match self.api.get_reporter(wallet_address).await {
            Ok(profile) => {
                debug!(wallet = %wallet_address, name = %profile.full_name, "Reporter profile loaded");
                self.reporter = ReporterStatus::Registered(profile);
            }
            Err(ClientError::NotFound(_)) => {
                debug!(wallet = %wallet_address, "No reporter profile for wallet");
                self.reporter = ReporterStatus::Missing;
            }
            Err(e) => {
                self.reporter = ReporterStatus::Unknown;
                return Err(e);
            }
        }
        Ok(())
    }

    fn set_phase(&mut self, attempt_id: Uuid, phase: Option<UploadPhase>) {
        if self.phase == phase {
            return;
        }
        self.phase = phase;
        self.emit(RedValidEvent::UploadPhaseChanged {
            attempt_id,
            phase,
            timestamp: Utc::now(),
        });
    }

    /// Record the failure message and hand the error back
    fn fail(&mut self, err: FlowError) -> FlowError {
        let message = user_message(&err);
        warn!(error = %err, message = %message, "Upload view action failed");
        self.phase = None;
        self.error = Some(message);
        err
    }

    fn emit(&self, event: RedValidEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}
