//! RedValid client
//!
//! Front-end logic for the RedValid video provenance service: a backend API
//! client, a wallet adapter, the query and upload views, and the tab shell.
//! Views are plain state machines so any front end (the bundled CLI, tests)
//! can drive them.

pub mod display;
pub mod error;
pub mod messages;
pub mod models;
pub mod selection;
pub mod services;
pub mod shell;
pub mod views;
pub mod wallet;

use crate::error::ClientError;
use crate::services::{BackendApi, BackendClient};
use crate::views::{QueryView, UploadView};
use crate::wallet::{WalletAdapter, WalletCapability};
use redvalid_common::config::ClientConfig;
use redvalid_common::events::EventBus;
use std::sync::Arc;

/// Event bus capacity for a single interactive session
const EVENT_BUS_CAPACITY: usize = 100;

/// Everything a view needs, resolved once at startup
#[derive(Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub backend: Arc<dyn BackendApi>,
    pub wallet: WalletCapability,
    pub event_bus: EventBus,
}

impl AppContext {
    /// Build the HTTP client and detect the wallet from `config`
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = BackendClient::new(&config.backend_url, config.file_prepare_timeout)?;
        let wallet = WalletCapability::detect(config.wallet_bridge_url.as_deref());
        Ok(Self::with_parts(config, Arc::new(backend), wallet))
    }

    pub fn with_parts(
        config: ClientConfig,
        backend: Arc<dyn BackendApi>,
        wallet: WalletCapability,
    ) -> Self {
        Self {
            config,
            backend,
            wallet,
            event_bus: EventBus::new(EVENT_BUS_CAPACITY),
        }
    }

    /// Query view, optionally seeded from the shell's search input
    pub fn query_view(&self, initial_url: Option<&str>) -> QueryView {
        let view = QueryView::new(Arc::clone(&self.backend), self.config.max_file_bytes)
            .with_event_bus(self.event_bus.clone());
        match initial_url {
            Some(url) => view.with_initial_url(url),
            None => view,
        }
    }

    pub fn upload_view(&self) -> UploadView {
        UploadView::new(
            Arc::clone(&self.backend),
            WalletAdapter::new(self.wallet.clone()),
            self.config.network.clone(),
            self.config.max_file_bytes,
        )
        .with_event_bus(self.event_bus.clone())
    }
}
