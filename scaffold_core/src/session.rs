//! # View State
//!
//! Everything a calculator screen holds, in one value, changed only through
//! the named handlers below. Front ends render from it and feed it events;
//! the two network calls happen outside and come back in as
//! [`ViewState::finish_submit`] / [`ViewState::finish_token_exchange`].
//!
//! ```text
//! mount ──► (exchange?) ──► edit fields / token ──► begin_submit ──► finish_submit
//!                                                        │               │
//!                                                   busy = true     busy = false
//! ```
//!
//! Result and error share one slot ([`Outcome`]), so at most one of them is
//! ever visible.
//!
//! ## Example
//!
//! ```rust
//! use scaffold_core::form::{FieldName, Location};
//! use scaffold_core::launch::LaunchParams;
//! use scaffold_core::session::ViewState;
//! use scaffold_core::token_store::MemoryTokenStore;
//!
//! let mut store = MemoryTokenStore::with_token("abc");
//! let mut state = ViewState::default();
//! state.mount(&LaunchParams::default(), &mut store);
//!
//! state.select_location(Location::Outside);
//! state.edit_field(FieldName::Length, "10");
//! state.edit_field(FieldName::Height, "4");
//!
//! let submission = state.begin_submit(&mut store).unwrap();
//! assert_eq!(submission.token, "abc");
//! assert!(state.busy);
//! ```

use crate::api::{CalculationRequest, CalculationResult};
use crate::errors::{CalcError, CalcResult};
use crate::export::{ExportFile, ExportFormat, ExportReport};
use crate::form::{FieldName, FormState, InsideType, Location};
use crate::launch::{LaunchParams, TokenSource};
use crate::token_store::TokenStore;

/// What the result area shows
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(CalculationResult),
    Error(String),
}

/// Work mount leaves for the front end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountPlan {
    /// Replace the visible URL with its cleaned form
    pub clean_url: bool,
    /// Exchange these payment ids for a token
    pub exchange: Option<PaymentExchange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentExchange {
    pub user_id: String,
    pub payment_id: String,
}

/// A validated submission, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub token: String,
    pub request: CalculationRequest,
}

/// Complete state of one calculator screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub form: FormState,
    /// Access token as currently entered
    pub token: String,
    pub outcome: Option<Outcome>,
    /// A calculation or token exchange is in flight
    pub busy: bool,
    pub justification_open: bool,
    /// Transient status line ("token saved", "exported to ...")
    pub notice: Option<String>,
    mounted: bool,
    /// Last token known to be in the store
    persisted_token: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Initial token acquisition. Runs once; later calls do nothing.
    pub fn mount(&mut self, params: &LaunchParams, store: &mut dyn TokenStore) -> MountPlan {
        if self.mounted {
            tracing::debug!("mount called again, ignoring");
            return MountPlan::default();
        }
        self.mounted = true;

        if let Some(stored) = store.load() {
            tracing::info!("Restored access token from storage");
            self.token = stored.clone();
            self.persisted_token = Some(stored);
        }

        if let Some(error) = &params.error {
            tracing::warn!("Launched with error parameter: {}", error);
            self.set_error(error.clone());
        }

        let mut plan = MountPlan {
            clean_url: !params.is_empty(),
            exchange: None,
        };

        match params.token_source() {
            TokenSource::Direct(token) => {
                tracing::info!("Access token received in launch URL");
                self.accept_token(token, store);
            }
            TokenSource::Payment { user_id, payment_id } => {
                self.busy = true;
                plan.exchange = Some(PaymentExchange { user_id, payment_id });
            }
            TokenSource::Stored => {}
        }

        plan
    }

    /// Result of the payment-id exchange started by [`ViewState::mount`].
    ///
    /// On failure the current token is left as it was.
    pub fn finish_token_exchange(&mut self, outcome: CalcResult<String>, store: &mut dyn TokenStore) {
        self.busy = false;
        match outcome {
            Ok(token) => {
                tracing::info!("Access token obtained from payment");
                self.accept_token(token, store);
                self.notice = Some("Оплата подтверждена, токен сохранен.".to_string());
            }
            Err(e) => {
                tracing::warn!("Payment exchange failed: {}", e);
                self.set_error(e.user_message());
            }
        }
    }

    /// Manual token entry. Persisted on the next submit.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn select_location(&mut self, location: Location) {
        self.form.select_location(location);
    }

    pub fn select_inside_type(&mut self, inside_type: InsideType) {
        self.form.select_inside_type(inside_type);
    }

    pub fn edit_field(&mut self, name: FieldName, value: impl Into<String>) {
        self.form.set_field(name, value);
    }

    /// Fields to render for the current selection
    pub fn visible_fields(&self) -> &'static [FieldName] {
        self.form.active_fields()
    }

    /// Validate and start a submission.
    ///
    /// Any validation failure is also shown as the error; only a submit
    /// while busy leaves the screen untouched.
    pub fn begin_submit(&mut self, store: &mut dyn TokenStore) -> CalcResult<Submission> {
        if self.busy {
            return Err(CalcError::Busy);
        }

        let checked = if self.token.trim().is_empty() {
            Err(CalcError::MissingToken)
        } else if !self.form.has_complete_selection() {
            Err(CalcError::MissingSelection)
        } else {
            self.form.to_request()
        };

        let request = match checked {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(code = e.error_code(), "Submission blocked");
                self.set_error(e.user_message());
                return Err(e);
            }
        };

        let token = self.token.trim().to_string();
        if self.persisted_token.as_deref() != Some(token.as_str()) {
            self.persist(&token, store);
        }

        self.outcome = None;
        self.notice = None;
        self.busy = true;

        Ok(Submission { token, request })
    }

    /// Apply the outcome of the request sent for [`ViewState::begin_submit`].
    pub fn finish_submit(&mut self, outcome: CalcResult<CalculationResult>, store: &mut dyn TokenStore) {
        self.busy = false;
        match outcome {
            Ok(result) => {
                self.outcome = Some(Outcome::Result(result));
            }
            Err(e) => {
                if e.is_token_expiry() {
                    tracing::info!("Server reported the access token as expired, clearing it");
                    self.token.clear();
                    self.persisted_token = None;
                    if let Err(clear_err) = store.clear() {
                        tracing::warn!("Failed to clear stored token: {}", clear_err);
                    }
                }
                self.set_error(e.user_message());
            }
        }
    }

    pub fn toggle_justification(&mut self) {
        self.justification_open = !self.justification_open;
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        match &self.outcome {
            Some(Outcome::Result(result)) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Error(message)) => Some(message),
            _ => None,
        }
    }

    /// Report of the current result, if there is one
    pub fn report(&self) -> Option<ExportReport> {
        self.result().map(|result| ExportReport::new(&self.form, result.clone()))
    }

    /// Render the current result for download. Nothing is produced without one.
    pub fn export(&self, format: ExportFormat) -> CalcResult<ExportFile> {
        let report = self.report().ok_or(CalcError::NoResult)?;
        report.render(format)
    }

    fn set_error(&mut self, message: String) {
        self.outcome = Some(Outcome::Error(message));
    }

    fn accept_token(&mut self, token: String, store: &mut dyn TokenStore) {
        self.token = token.clone();
        self.persist(&token, store);
    }

    fn persist(&mut self, token: &str, store: &mut dyn TokenStore) {
        match store.save(token) {
            Ok(()) => self.persisted_token = Some(token.to_string()),
            Err(e) => tracing::warn!("Failed to persist access token: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Justification;
    use crate::token_store::MemoryTokenStore;

    fn sample_result() -> CalculationResult {
        CalculationResult {
            volume: 42.5,
            formula: "L*H".into(),
            formula_breakdown: vec!["L=10".into(), "H=4.25".into()],
            coefficient: None,
            justification: Some(Justification {
                title: "Norm".into(),
                text: "...".into(),
            }),
        }
    }

    fn ready_state(token: &str) -> ViewState {
        let mut state = ViewState::new();
        state.set_token(token);
        state.select_location(Location::Outside);
        state.edit_field(FieldName::Length, "10");
        state.edit_field(FieldName::Height, "4.25");
        state
    }

    #[test]
    fn test_empty_token_blocks_submission() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("   ");

        let err = state.begin_submit(&mut store).unwrap_err();
        assert_eq!(err, CalcError::MissingToken);
        assert!(!state.busy);
        assert_eq!(state.error(), Some("Пожалуйста, введите ваш токен доступа."));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_empty_token_reported_before_selection() {
        let mut store = MemoryTokenStore::new();
        let mut state = ViewState::new();

        assert_eq!(state.begin_submit(&mut store).unwrap_err(), CalcError::MissingToken);
        assert_eq!(state.error(), Some("Пожалуйста, введите ваш токен доступа."));
        assert!(!state.busy);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_incomplete_selection_blocks_submission() {
        let mut store = MemoryTokenStore::new();
        let mut state = ViewState::new();
        state.set_token("abc");
        state.outcome = Some(Outcome::Result(sample_result()));

        assert_eq!(state.begin_submit(&mut store).unwrap_err(), CalcError::MissingSelection);
        assert!(state.result().is_none());
    }

    #[test]
    fn test_begin_submit_clears_outcome_and_sets_busy() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("abc");
        state.outcome = Some(Outcome::Error("old".into()));

        let submission = state.begin_submit(&mut store).unwrap();
        assert!(state.busy);
        assert_eq!(state.outcome, None);
        assert_eq!(submission.token, "abc");
        assert_eq!(submission.request.fields.len(), 2);
        assert_eq!(store.load().as_deref(), Some("abc"));
    }

    #[test]
    fn test_second_submit_while_busy_is_rejected() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("abc");
        state.begin_submit(&mut store).unwrap();

        assert_eq!(state.begin_submit(&mut store).unwrap_err(), CalcError::Busy);
        assert!(state.busy);
        assert_eq!(state.outcome, None);
    }

    #[test]
    fn test_success_replaces_error() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("abc");
        state.outcome = Some(Outcome::Error("Не удалось связаться с сервером.".into()));
        state.begin_submit(&mut store).unwrap();

        state.finish_submit(Ok(sample_result()), &mut store);
        assert!(!state.busy);
        assert_eq!(state.error(), None);
        let result = state.result().unwrap();
        assert_eq!(result.volume_display(), "42.5");
        assert_eq!(result.formula_breakdown, vec!["L=10", "H=4.25"]);
    }

    #[test]
    fn test_token_expiry_clears_token() {
        let mut store = MemoryTokenStore::with_token("abc");
        let mut state = ViewState::new();
        state.mount(&LaunchParams::default(), &mut store);
        state.select_location(Location::Outside);
        state.edit_field(FieldName::Length, "10");
        state.edit_field(FieldName::Height, "4");
        state.begin_submit(&mut store).unwrap();

        state.finish_submit(
            Err(CalcError::server_rejected(Some("token expired".into()))),
            &mut store,
        );

        assert!(!state.busy);
        assert_eq!(state.error(), Some("token expired"));
        assert_eq!(state.token, "");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_other_rejection_keeps_token() {
        let mut store = MemoryTokenStore::with_token("abc");
        let mut state = ready_state("abc");
        state.begin_submit(&mut store).unwrap();
        state.finish_submit(Err(CalcError::server_rejected(None)), &mut store);

        assert_eq!(state.error(), Some(crate::errors::UNKNOWN_SERVER_ERROR));
        assert_eq!(state.token, "abc");
        assert_eq!(store.load().as_deref(), Some("abc"));
    }

    #[test]
    fn test_network_failure_clears_busy() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("abc");
        state.begin_submit(&mut store).unwrap();
        state.finish_submit(Err(CalcError::network("refused")), &mut store);

        assert!(!state.busy);
        assert_eq!(state.error(), Some("Не удалось связаться с сервером."));
    }

    #[test]
    fn test_mount_captures_url_token_once() {
        let mut store = MemoryTokenStore::with_token("old");
        let mut state = ViewState::new();
        let params = LaunchParams::from_pairs([("token", "fresh")]);

        let plan = state.mount(&params, &mut store);
        assert!(plan.clean_url);
        assert_eq!(plan.exchange, None);
        assert_eq!(state.token, "fresh");
        assert_eq!(store.load().as_deref(), Some("fresh"));

        let again = state.mount(&LaunchParams::from_pairs([("token", "other")]), &mut store);
        assert_eq!(again, MountPlan::default());
        assert_eq!(state.token, "fresh");
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_remount_without_param_restores_stored_token() {
        let mut store = MemoryTokenStore::new();
        ViewState::new().mount(&LaunchParams::from_pairs([("token", "t1")]), &mut store);

        let mut reloaded = ViewState::new();
        let plan = reloaded.mount(&LaunchParams::default(), &mut store);
        assert!(!plan.clean_url);
        assert_eq!(reloaded.token, "t1");
    }

    #[test]
    fn test_payment_exchange_flow() {
        let mut store = MemoryTokenStore::new();
        let mut state = ViewState::new();
        let params = LaunchParams::from_pairs([("userId", "42"), ("paymentId", "p-1")]);

        let plan = state.mount(&params, &mut store);
        assert_eq!(
            plan.exchange,
            Some(PaymentExchange {
                user_id: "42".into(),
                payment_id: "p-1".into()
            })
        );
        assert!(state.busy);

        state.finish_token_exchange(Ok("paid-token".into()), &mut store);
        assert!(!state.busy);
        assert_eq!(state.token, "paid-token");
        assert_eq!(store.load().as_deref(), Some("paid-token"));
    }

    #[test]
    fn test_failed_exchange_keeps_token() {
        let mut store = MemoryTokenStore::with_token("keep");
        let mut state = ViewState::new();
        state.mount(&LaunchParams::from_pairs([("userId", "1"), ("paymentId", "2")]), &mut store);

        state.finish_token_exchange(
            Err(CalcError::TokenExchangeFailed {
                message: "Платеж не найден".into(),
            }),
            &mut store,
        );
        assert_eq!(state.token, "keep");
        assert_eq!(state.error(), Some("Платеж не найден"));
    }

    #[test]
    fn test_error_param_is_shown() {
        let mut store = MemoryTokenStore::new();
        let mut state = ViewState::new();
        state.mount(&LaunchParams::from_pairs([("error", "Оплата отменена")]), &mut store);
        assert_eq!(state.error(), Some("Оплата отменена"));
    }

    #[test]
    fn test_manual_token_persisted_on_submit_only_when_changed() {
        let mut store = MemoryTokenStore::with_token("abc");
        let mut state = ViewState::new();
        state.mount(&LaunchParams::default(), &mut store);
        state.select_location(Location::Outside);
        state.edit_field(FieldName::Length, "1");
        state.edit_field(FieldName::Height, "1");

        state.begin_submit(&mut store).unwrap();
        state.finish_submit(Ok(sample_result()), &mut store);
        assert_eq!(store.writes(), 0);

        state.set_token("new-token");
        state.begin_submit(&mut store).unwrap();
        assert_eq!(store.load().as_deref(), Some("new-token"));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_justification_toggle_independent_of_result() {
        let mut store = MemoryTokenStore::new();
        let mut state = ready_state("abc");
        state.toggle_justification();
        state.begin_submit(&mut store).unwrap();
        state.finish_submit(Ok(sample_result()), &mut store);
        assert!(state.justification_open);
        state.toggle_justification();
        assert!(!state.justification_open);
    }

    #[test]
    fn test_export_without_result_produces_nothing() {
        let state = ready_state("abc");
        assert_eq!(state.export(ExportFormat::Word).unwrap_err(), CalcError::NoResult);
        assert!(state.report().is_none());
    }
}
