//! # scaffold_core - Scaffolding Volume Calculator Client
//!
//! `scaffold_core` holds everything the calculator front ends share: the
//! form model, the view state and its event handlers, the HTTP client for
//! the remote calculation service, token persistence and document export.
//! The volume itself is computed by the server; this crate only collects
//! inputs, ships them, and presents what comes back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scaffold_core::{ApiClient, Config, ViewState};
//! use scaffold_core::form::{FieldName, Location};
//! use scaffold_core::launch::LaunchParams;
//! use scaffold_core::token_store::MemoryTokenStore;
//!
//! # async fn run() -> scaffold_core::CalcResult<()> {
//! let client = ApiClient::new(Config::load())?;
//! let mut store = MemoryTokenStore::with_token("my-token");
//! let mut state = ViewState::new();
//! state.mount(&LaunchParams::default(), &mut store);
//!
//! state.select_location(Location::Outside);
//! state.edit_field(FieldName::Length, "12");
//! state.edit_field(FieldName::Height, "9");
//!
//! let submission = state.begin_submit(&mut store)?;
//! let outcome = client.calculate(&submission.token, &submission.request).await;
//! state.finish_submit(outcome, &mut store);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`form`] - Discriminants, fields and the required-field function
//! - [`session`] - View state and named event handlers
//! - [`api`] - JSON envelopes of the remote endpoints
//! - [`client`] - Async HTTP client (reqwest)
//! - [`launch`] - Launch URL parameters (token, payment redirect)
//! - [`token_store`] - Token persistence
//! - [`export`] - Word and PDF reports
//! - [`config`] - Endpoint configuration
//! - [`errors`] - Structured error types

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod form;
pub mod launch;
pub mod session;
pub mod token_store;

#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
#[cfg(not(target_arch = "wasm32"))]
pub mod paths;
#[cfg(not(target_arch = "wasm32"))]
pub mod pdf;

// Re-export commonly used types at crate root for convenience
pub use api::{CalculationRequest, CalculationResult};
pub use client::ApiClient;
pub use config::Config;
pub use errors::{CalcError, CalcResult};
pub use export::{ExportFile, ExportFormat};
pub use session::{Outcome, ViewState};
