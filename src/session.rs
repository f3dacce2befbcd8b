//! Session creation
//!
//! A "session" is the server-side execution context (transaction) backing
//! one data grid or query tool panel. [`SessionCreator::create`] issues the
//! initialize request and folds every outcome into a single
//! [`SessionEvent`], which is handed to exactly one consumer: the panel
//! launch of the calling flow, or the delegate that asked for it.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};
use url::Url;

use crate::api::{with_recreate_flag, DataGridApi};
use crate::error::ApiError;
use crate::host::AlertSink;

const INIT_ERROR_TITLE: &str = "Query Tool initialization error";

/// A server-assigned execution session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: u64,
    pub is_query_tool: bool,
    pub server_type: String,
    /// Raw URL of a query-tool target (script source), empty for grids
    pub source_url: String,
    /// Grid label or script label, empty for an ad-hoc query tool
    pub panel_title: String,
    /// Anything else the backend returned with the session
    pub extra: Map<String, Value>,
}

/// Everything needed to request one session
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub url: Url,
    pub filter_text: String,
    pub server_type: String,
    pub panel_title: String,
    pub source_url: String,
    pub is_query_tool: bool,
    pub force_recreate: bool,
}

impl SessionRequest {
    pub fn data_grid(url: Url, server_type: &str, grid_title: &str) -> Self {
        Self {
            url,
            filter_text: String::new(),
            server_type: server_type.to_string(),
            panel_title: grid_title.to_string(),
            source_url: String::new(),
            is_query_tool: false,
            force_recreate: false,
        }
    }

    pub fn query_tool(url: Url, server_type: &str, source_url: &str, script_label: &str) -> Self {
        Self {
            url,
            filter_text: String::new(),
            server_type: server_type.to_string(),
            panel_title: script_label.to_string(),
            source_url: source_url.to_string(),
            is_query_tool: true,
            force_recreate: false,
        }
    }

    pub fn with_filter(mut self, filter_text: impl Into<String>) -> Self {
        self.filter_text = filter_text.into();
        self
    }

    pub fn recreate(mut self, force: bool) -> Self {
        self.force_recreate = force;
        self
    }
}

/// JSON-encoded filter clause, or `None` for an empty filter. The backend
/// must never receive a body it will not read.
pub fn request_body(filter_text: &str) -> Option<String> {
    if filter_text.is_empty() {
        None
    } else {
        Some(Value::from(filter_text).to_string())
    }
}

/// A panel that asks for (re)creation of its own session
pub trait SessionDelegate: Send + Sync {
    fn on_session_created(&self, session: Session);

    /// Called instead of an alert when the backend reports a lost connection
    fn handle_connection_lost(&self, create_transaction: bool, error: &ApiError);
}

/// Who consumes the result of a creation call
#[derive(Clone)]
pub enum SessionTarget {
    /// The launcher itself; a new panel is opened for the session
    Module,
    Delegate(Arc<dyn SessionDelegate>),
}

impl std::fmt::Debug for SessionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionTarget::Module => f.write_str("Module"),
            SessionTarget::Delegate(_) => f.write_str("Delegate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub reason: String,
    pub connection_lost: bool,
}

/// Outcome of one creation call
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Created(Session),
    Failed(SessionFailure),
}

pub struct SessionCreator {
    api: Arc<dyn DataGridApi>,
    alerts: Arc<dyn AlertSink>,
}

impl SessionCreator {
    pub fn new(api: Arc<dyn DataGridApi>, alerts: Arc<dyn AlertSink>) -> Self {
        Self { api, alerts }
    }

    /// Create a session. Failures are alerted here (or routed to the
    /// delegate's connection-lost handler) and never retried.
    pub async fn create(&self, request: SessionRequest, target: SessionTarget) -> SessionEvent {
        let url = if request.force_recreate {
            with_recreate_flag(request.url.clone())
        } else {
            request.url.clone()
        };
        let body = request_body(&request.filter_text);

        match self.api.initialize(url, body).await {
            Ok(data) => {
                let session = Session {
                    session_id: data.session_id,
                    is_query_tool: request.is_query_tool,
                    server_type: request.server_type,
                    source_url: request.source_url,
                    panel_title: request.panel_title,
                    extra: data.extra,
                };
                info!(
                    session_id = session.session_id,
                    is_query_tool = session.is_query_tool,
                    "Session created"
                );
                if let SessionTarget::Delegate(delegate) = &target {
                    delegate.on_session_created(session.clone());
                }
                SessionEvent::Created(session)
            }
            Err(error) => {
                if let SessionTarget::Delegate(delegate) = &target {
                    if error.is_connection_lost() {
                        warn!("Connection lost while recreating session");
                        delegate.handle_connection_lost(true, &error);
                        return SessionEvent::Failed(SessionFailure {
                            reason: error.to_string(),
                            connection_lost: true,
                        });
                    }
                }

                let message = error.user_message();
                warn!(error = %error, "Session creation failed");
                self.alerts.alert(INIT_ERROR_TITLE, &message);
                SessionEvent::Failed(SessionFailure {
                    reason: message,
                    connection_lost: false,
                })
            }
        }
    }
}
