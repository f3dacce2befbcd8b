//! Panel orchestration
//!
//! Binds a freshly created [`Session`] to UI: either a new browser window
//! or a panel stacked into the docking layout. A docked panel's embedded
//! frame bootstraps on its own schedule, so the content URL is only loaded
//! after a readiness poll observes the panel's frame-initialized flag.
//!
//! Per docked panel:
//! - the poll loads content at most once, and only after readiness
//! - closing the panel stops the poll and fires a best-effort teardown
//! - the poll gives up after the configured timeout, or when the panel
//!   turns out to have no frame, clearing the busy indicator either way
//!
//! Launches are independent; nothing here is shared between panels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{DataGridApi, Endpoints};
use crate::error::{DataGridError, Result};
use crate::host::{AlertSink, BusyIndicator, DockPanel, DockingHost};
use crate::session::Session;
use crate::title::{derive_chrome, EscapedTitle, PanelChrome, PanelTitleSource, TitleMode};

/// Panel that new datagrid panels are stacked with
pub const ANCHOR_PANEL: &str = "properties";

/// Frame type registered for datagrid panels
pub const FRAME_TYPE: &str = "frm_datagrid";

const LOAD_FAILED_TITLE: &str = "Query Tool initialization error";
const LOAD_FAILED_MESSAGE: &str = "The panel did not finish loading. Close it and try again.";

/// How the readiness poll of a docked panel ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoad {
    /// Content URL handed to the frame
    Loaded,
    /// Panel closed before its frame reported readiness
    PanelClosed,
    /// Frame never reported readiness
    TimedOut,
    /// Readiness reported but the panel had no embedded frame to load into
    FrameMissing,
}

/// Result of launching a session
#[derive(Debug)]
pub enum LaunchedPanel {
    Window {
        session_id: u64,
        chrome: PanelChrome,
        content_url: Url,
    },
    Docked {
        session_id: u64,
        dom_id: String,
        chrome: PanelChrome,
        content_url: Url,
        load: JoinHandle<FrameLoad>,
    },
}

impl LaunchedPanel {
    pub fn session_id(&self) -> u64 {
        match self {
            LaunchedPanel::Window { session_id, .. } | LaunchedPanel::Docked { session_id, .. } => {
                *session_id
            }
        }
    }

    pub fn chrome(&self) -> &PanelChrome {
        match self {
            LaunchedPanel::Window { chrome, .. } | LaunchedPanel::Docked { chrome, .. } => chrome,
        }
    }

    pub fn content_url(&self) -> &Url {
        match self {
            LaunchedPanel::Window { content_url, .. }
            | LaunchedPanel::Docked { content_url, .. } => content_url,
        }
    }
}

/// Readiness poll timing
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

pub struct PanelOrchestrator {
    api: Arc<dyn DataGridApi>,
    docking: Arc<dyn DockingHost>,
    alerts: Arc<dyn AlertSink>,
    titles: Arc<dyn PanelTitleSource>,
    endpoints: Endpoints,
    poll: PollSettings,
}

impl PanelOrchestrator {
    pub fn new(
        api: Arc<dyn DataGridApi>,
        docking: Arc<dyn DockingHost>,
        alerts: Arc<dyn AlertSink>,
        titles: Arc<dyn PanelTitleSource>,
        endpoints: Endpoints,
        poll: PollSettings,
    ) -> Self {
        Self {
            api,
            docking,
            alerts,
            titles,
            endpoints,
            poll,
        }
    }

    /// Show `session` in a new window or a docked panel.
    ///
    /// Must be called inside a tokio runtime; docked panels spawn their
    /// readiness poll and teardown onto it.
    pub fn launch(&self, session: Session, open_in_new_tab: bool) -> Result<LaunchedPanel> {
        let base_title = self.titles.next_title();
        let chrome = derive_chrome(&TitleMode::for_session(&session), &base_title);
        let escaped = EscapedTitle::encode(&chrome.title);
        let content_url = self.endpoints.panel(
            session.session_id,
            session.is_query_tool,
            &escaped,
            &session.source_url,
            &session.server_type,
        );

        if open_in_new_tab {
            self.open_window(session, chrome, content_url)
        } else {
            self.open_docked(session, chrome, content_url)
        }
    }

    fn open_window(
        &self,
        session: Session,
        chrome: PanelChrome,
        content_url: Url,
    ) -> Result<LaunchedPanel> {
        let Some(window) = self.docking.open_window(&content_url) else {
            self.teardown(session.session_id);
            return Err(DataGridError::Docking("window could not be opened".into()));
        };

        let title = chrome.title.clone();
        window.on_load(Box::new(move |win| win.set_document_title(&title)));

        info!(session_id = session.session_id, "Session opened in new window");
        Ok(LaunchedPanel::Window {
            session_id: session.session_id,
            chrome,
            content_url,
        })
    }

    fn open_docked(
        &self,
        session: Session,
        chrome: PanelChrome,
        content_url: Url,
    ) -> Result<LaunchedPanel> {
        let session_id = session.session_id;
        let panel = self
            .docking
            .find_panels(ANCHOR_PANEL)
            .first()
            .and_then(|anchor| self.docking.add_stacked_panel(FRAME_TYPE, anchor));
        let Some(panel) = panel else {
            self.teardown(session_id);
            return Err(DataGridError::Docking(format!(
                "no '{}' panel to stack the datagrid with",
                ANCHOR_PANEL
            )));
        };

        panel.set_title(&chrome.title_markup());
        panel.set_icon(chrome.icon);
        panel.focus();

        let (closed_tx, closed_rx) = watch::channel(false);
        let api = Arc::clone(&self.api);
        let close_url = self.endpoints.close(session_id);
        panel.on_close(Box::new(move || {
            let _ = closed_tx.send(true);
            debug!(session_id, "Panel closed, tearing down session");
            spawn_teardown(api, close_url);
        }));

        let busy = panel.insert_busy_indicator();
        let load = tokio::spawn(poll_frame_ready(
            Arc::clone(&panel),
            busy,
            content_url.clone(),
            closed_rx,
            self.poll,
            Arc::clone(&self.alerts),
            session_id,
        ));

        info!(session_id, dom_id = %panel.dom_id(), "Session docked");
        Ok(LaunchedPanel::Docked {
            session_id,
            dom_id: panel.dom_id(),
            chrome,
            content_url,
            load,
        })
    }

    fn teardown(&self, session_id: u64) {
        spawn_teardown(Arc::clone(&self.api), self.endpoints.close(session_id));
    }
}

/// Fire-and-forget session teardown
fn spawn_teardown(api: Arc<dyn DataGridApi>, url: Url) {
    tokio::spawn(async move {
        if let Err(e) = api.close(url).await {
            debug!(error = %e, "Session teardown failed (ignored)");
        }
    });
}

/// Clear the spinner of a panel whose content will never load
fn abandon_load(busy: &dyn BusyIndicator, alerts: &dyn AlertSink) {
    busy.remove();
    alerts.alert(LOAD_FAILED_TITLE, LOAD_FAILED_MESSAGE);
}

async fn poll_frame_ready(
    panel: Arc<dyn DockPanel>,
    busy: Arc<dyn BusyIndicator>,
    content_url: Url,
    mut closed: watch::Receiver<bool>,
    settings: PollSettings,
    alerts: Arc<dyn AlertSink>,
    session_id: u64,
) -> FrameLoad {
    let mut ticker = interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = sleep(settings.timeout);
    tokio::pin!(deadline);

    debug!(session_id, "Waiting for panel frame");
    loop {
        tokio::select! {
            biased;

            // A dropped sender means the panel (and its close hook) is gone.
            _ = closed.wait_for(|closed| *closed) => {
                debug!(session_id, "Panel closed before frame was ready");
                return FrameLoad::PanelClosed;
            }
            // Ticks go before the deadline so a frame that is already
            // ready still loads when the timeout is zero.
            _ = ticker.tick() => {
                if !panel.frame_initialized() {
                    continue;
                }
                let Some(frame) = panel.embedded_frame() else {
                    warn!(session_id, "Panel reported ready without an embedded frame");
                    abandon_load(busy.as_ref(), alerts.as_ref());
                    return FrameLoad::FrameMissing;
                };
                frame.on_loaded(Box::new(move || busy.remove()));
                frame.open_url(&content_url);
                debug!(session_id, "Content loaded into panel frame");
                return FrameLoad::Loaded;
            }
            _ = &mut deadline => {
                warn!(
                    session_id,
                    timeout_ms = settings.timeout.as_millis() as u64,
                    "Panel frame never became ready"
                );
                abandon_load(busy.as_ref(), alerts.as_ref());
                return FrameLoad::TimedOut;
            }
        }
    }
}
