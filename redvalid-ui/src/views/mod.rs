//! Interactive views
//!
//! Each view is a small state machine owned by one front end. Views call the
//! backend through [`crate::services::BackendApi`] and the wallet through
//! [`crate::wallet::WalletAdapter`]; neither touches global state.

pub mod query;
pub mod upload;

pub use query::{QueryResult, QueryState, QueryView, ResultKind};
pub use upload::{ReporterStatus, UploadView};
