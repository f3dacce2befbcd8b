//! Filtered-rows dialog
//!
//! Before a filtered data grid is created, the user types a row filter which
//! the backend validates. The dialog is a small state machine:
//!
//! ```text
//! Closed -> Open -> Validating -> Open        (rejected / transport error)
//!                              -> Submitting -> Closed
//! Open -> Closed                              (cancel)
//! ```
//!
//! One [`FilterDialog`] exists per [`crate::DataGrid`] and is reused for every
//! invocation. Its state lives behind a mutex that is never held across a
//! network call; while `Validating` or `Submitting`, every control is
//! disabled.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::api::DataGridApi;
use crate::host::AlertSink;
use crate::node::FilterRequest;
use crate::prefs::EditorSettings;
use crate::session::{SessionCreator, SessionEvent, SessionRequest, SessionTarget};

pub const DIALOG_TITLE: &str = "Data Filter";
const VALIDATION_ERROR_TITLE: &str = "Validation Error";

/// Lifecycle state of the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Closed,
    Open,
    Validating,
    Submitting,
}

/// What a dialog invocation is about, captured when it is opened
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub request: FilterRequest,
    /// Session initialize URL
    pub session_url: Url,
    pub validate_url: Url,
    pub server_type: String,
    pub grid_title: String,
}

/// Snapshot for the host to render
#[derive(Debug, Clone, PartialEq)]
pub struct FilterView {
    pub title: &'static str,
    pub state: FilterState,
    pub markup: String,
    pub editor: Option<EditorSettings>,
    pub buffer: String,
    pub ok_enabled: bool,
    pub controls_enabled: bool,
    /// Delay before the editor should take focus
    pub focus_delay: Duration,
}

/// Result of pressing OK
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// Nothing happened: empty buffer, or the dialog was not open
    Ignored,
    /// Backend rejected the filter; the dialog stays open
    Rejected(String),
    /// Validation request failed; the dialog stays open
    TransportFailed(String),
    /// Filter accepted and session creation attempted; the dialog is closed
    Submitted(SessionEvent),
}

struct Inner {
    state: FilterState,
    buffer: String,
    markup: String,
    editor: Option<EditorSettings>,
    context: Option<FilterContext>,
}

pub struct FilterDialog {
    inner: Mutex<Inner>,
    api: Arc<dyn DataGridApi>,
    alerts: Arc<dyn AlertSink>,
    focus_delay: Duration,
}

impl FilterDialog {
    pub fn new(api: Arc<dyn DataGridApi>, alerts: Arc<dyn AlertSink>, focus_delay: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: FilterState::Closed,
                buffer: String::new(),
                markup: String::new(),
                editor: None,
                context: None,
            }),
            api,
            alerts,
            focus_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent across a panicking holder: every write is a
        // single field assignment.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> FilterState {
        self.lock().state
    }

    /// Show the dialog for a new invocation with an empty buffer. Returns
    /// `false`, leaving the dialog untouched, while a request is in flight.
    pub fn open(&self, context: FilterContext, markup: String, editor: EditorSettings) -> bool {
        let mut inner = self.lock();
        if matches!(inner.state, FilterState::Validating | FilterState::Submitting) {
            debug!("Filter dialog busy, ignoring open");
            return false;
        }
        inner.state = FilterState::Open;
        inner.buffer.clear();
        inner.markup = markup;
        inner.editor = Some(editor);
        inner.context = Some(context);
        true
    }

    /// Replace the buffer. Rejected unless the dialog is open for editing.
    pub fn set_text(&self, text: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.state != FilterState::Open {
            return false;
        }
        inner.buffer = text.into();
        true
    }

    pub fn can_confirm(&self) -> bool {
        let inner = self.lock();
        inner.state == FilterState::Open && !inner.buffer.is_empty()
    }

    pub fn view(&self) -> FilterView {
        let inner = self.lock();
        FilterView {
            title: DIALOG_TITLE,
            state: inner.state,
            markup: inner.markup.clone(),
            editor: inner.editor.clone(),
            buffer: inner.buffer.clone(),
            ok_enabled: inner.state == FilterState::Open && !inner.buffer.is_empty(),
            controls_enabled: inner.state == FilterState::Open,
            focus_delay: self.focus_delay,
        }
    }

    /// Close without creating anything
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != FilterState::Open {
            return false;
        }
        inner.state = FilterState::Closed;
        inner.context = None;
        true
    }

    /// Validate the buffer and, when accepted, create the filtered session.
    pub async fn confirm(&self, creator: &SessionCreator) -> FilterOutcome {
        let (filter, context) = {
            let mut inner = self.lock();
            if inner.state != FilterState::Open || inner.buffer.is_empty() {
                return FilterOutcome::Ignored;
            }
            let Some(context) = inner.context.clone() else {
                return FilterOutcome::Ignored;
            };
            inner.state = FilterState::Validating;
            (inner.buffer.clone(), context)
        };

        debug!(object_id = context.request.object_id, "Validating filter");
        let validation = self
            .api
            .validate_filter(context.validate_url.clone(), &filter)
            .await;

        match validation {
            Ok(v) if v.status => {
                self.lock().state = FilterState::Submitting;
                info!(object_id = context.request.object_id, "Filter accepted");
                let filtered = context.request.with_filter(filter);
                let request = SessionRequest::data_grid(
                    context.session_url,
                    &context.server_type,
                    &context.grid_title,
                )
                .with_filter(filtered.filter_text.unwrap_or_default());
                let event = creator.create(request, SessionTarget::Module).await;

                let mut inner = self.lock();
                inner.state = FilterState::Closed;
                inner.context = None;
                FilterOutcome::Submitted(event)
            }
            Ok(v) => {
                self.lock().state = FilterState::Open;
                debug!(result = %v.result, "Filter rejected");
                self.alerts.alert(VALIDATION_ERROR_TITLE, &v.result);
                FilterOutcome::Rejected(v.result)
            }
            Err(e) => {
                self.lock().state = FilterState::Open;
                warn!(error = %e, "Filter validation request failed");
                let detail = e.user_message();
                self.alerts.alert(VALIDATION_ERROR_TITLE, &detail);
                FilterOutcome::TransportFailed(detail)
            }
        }
    }
}
