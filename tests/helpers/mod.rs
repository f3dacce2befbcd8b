//! Shared fakes for the integration tests: a scripted backend and a
//! recording host UI.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use datagrid_session::api::{DataGridApi, FilterValidation, TransactionData};
use datagrid_session::host::{
    AlertSink, BrowserWindow, BusyIndicator, Callback, DockPanel, DockingHost, EmbeddedFrame,
    MenuHost,
};
use datagrid_session::menu::{MenuCategory, MenuEntry};
use datagrid_session::node::{NodeAncestors, NodeRef, SelectedNode, ServerRef};
use datagrid_session::prefs::{self, SqlEditorPreferences};
use datagrid_session::{ApiError, Collaborators, DataGrid, DataGridConfig, PanelIcon};
use serde_json::Map;
use tokio::sync::{watch, Notify};
use url::Url;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Scripted reply to an initialize call
#[derive(Debug, Clone)]
pub enum InitReply {
    Ok,
    Status(u16, String),
    Transport(String),
}

/// Scripted reply to a filter validation call
#[derive(Debug, Clone)]
pub enum ValidateReply {
    Valid,
    Invalid(String),
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitCall {
    pub url: Url,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct FakeApi {
    next_id: AtomicU64,
    init_replies: Mutex<VecDeque<InitReply>>,
    validate_replies: Mutex<VecDeque<ValidateReply>>,
    pub init_calls: Mutex<Vec<InitCall>>,
    pub validate_calls: Mutex<Vec<(Url, String)>>,
    pub close_calls: Mutex<Vec<Url>>,
    pub markup_calls: AtomicUsize,
    /// When set, validation waits for `release_validation`
    pub hold_validation: AtomicBool,
    pub release_validation: Notify,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(100),
            ..Default::default()
        })
    }

    pub fn push_init(&self, reply: InitReply) {
        self.init_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_validate(&self, reply: ValidateReply) {
        self.validate_replies.lock().unwrap().push_back(reply);
    }

    pub fn init_calls(&self) -> Vec<InitCall> {
        self.init_calls.lock().unwrap().clone()
    }

    pub fn closed_urls(&self) -> Vec<Url> {
        self.close_calls.lock().unwrap().clone()
    }
}

fn status_error(status: u16, body: String) -> ApiError {
    ApiError::Status {
        status,
        status_text: match status {
            503 => "Service Unavailable".to_string(),
            _ => "Internal Server Error".to_string(),
        },
        body,
    }
}

#[async_trait]
impl DataGridApi for FakeApi {
    async fn initialize(&self, url: Url, body: Option<String>) -> Result<TransactionData, ApiError> {
        self.init_calls.lock().unwrap().push(InitCall { url, body });
        let reply = self.init_replies.lock().unwrap().pop_front().unwrap_or(InitReply::Ok);
        match reply {
            InitReply::Ok => Ok(TransactionData {
                session_id: self.next_id.fetch_add(1, Ordering::SeqCst),
                extra: Map::new(),
            }),
            InitReply::Status(status, body) => Err(status_error(status, body)),
            InitReply::Transport(msg) => Err(ApiError::Transport(msg)),
        }
    }

    async fn validate_filter(&self, url: Url, filter: &str) -> Result<FilterValidation, ApiError> {
        self.validate_calls.lock().unwrap().push((url, filter.to_string()));
        if self.hold_validation.load(Ordering::SeqCst) {
            self.release_validation.notified().await;
        }
        let reply = self
            .validate_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ValidateReply::Valid);
        match reply {
            ValidateReply::Valid => Ok(FilterValidation {
                status: true,
                result: String::new(),
            }),
            ValidateReply::Invalid(result) => Ok(FilterValidation {
                status: false,
                result,
            }),
            ValidateReply::Transport(msg) => Err(ApiError::Transport(msg)),
        }
    }

    async fn filter_markup(&self, _url: Url) -> Result<String, ApiError> {
        self.markup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"<div><textarea id="sql_filter"></textarea></div>"#.to_string())
    }

    async fn close(&self, url: Url) -> Result<(), ApiError> {
        self.close_calls.lock().unwrap().push(url);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host UI
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAlerts {
    pub alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    pub fn all(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.all().into_iter().map(|(_, m)| m).collect()
    }
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

pub struct FakeBusy {
    pub present: AtomicBool,
}

impl BusyIndicator for FakeBusy {
    fn remove(&self) {
        self.present.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeFrame {
    pub opened: Mutex<Vec<Url>>,
    loaded_hook: Mutex<Option<Callback>>,
}

impl FakeFrame {
    /// Simulate the loaded document finishing
    pub fn finish_loading(&self) {
        if let Some(hook) = self.loaded_hook.lock().unwrap().take() {
            hook();
        }
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

impl EmbeddedFrame for FakeFrame {
    fn on_loaded(&self, callback: Callback) {
        *self.loaded_hook.lock().unwrap() = Some(callback);
    }

    fn open_url(&self, url: &Url) {
        self.opened.lock().unwrap().push(url.clone());
    }
}

pub struct FakePanel {
    pub dom_id: String,
    pub title: Mutex<String>,
    pub icon: Mutex<Option<PanelIcon>>,
    pub focused: AtomicBool,
    pub frame_ready: AtomicBool,
    pub frame: Option<Arc<FakeFrame>>,
    pub busy: Arc<FakeBusy>,
    pub readiness_checks: AtomicUsize,
    close_hook: Mutex<Option<Callback>>,
}

impl FakePanel {
    pub fn new(dom_id: &str, with_frame: bool) -> Arc<Self> {
        Arc::new(Self {
            dom_id: dom_id.to_string(),
            title: Mutex::new(String::new()),
            icon: Mutex::new(None),
            focused: AtomicBool::new(false),
            frame_ready: AtomicBool::new(false),
            frame: with_frame.then(|| Arc::new(FakeFrame::default())),
            busy: Arc::new(FakeBusy {
                present: AtomicBool::new(false),
            }),
            readiness_checks: AtomicUsize::new(0),
            close_hook: Mutex::new(None),
        })
    }

    /// The embedded frame's bootstrap completing
    pub fn mark_frame_ready(&self) {
        self.frame_ready.store(true, Ordering::SeqCst);
    }

    /// User closes the panel
    pub fn close(&self) {
        if let Some(hook) = self.close_hook.lock().unwrap().take() {
            hook();
        }
    }

    pub fn busy_visible(&self) -> bool {
        self.busy.present.load(Ordering::SeqCst)
    }

    pub fn opened_urls(&self) -> Vec<Url> {
        self.frame.as_ref().map(|f| f.opened()).unwrap_or_default()
    }
}

impl DockPanel for FakePanel {
    fn dom_id(&self) -> String {
        self.dom_id.clone()
    }

    fn set_title(&self, markup: &str) {
        *self.title.lock().unwrap() = markup.to_string();
    }

    fn set_icon(&self, icon: PanelIcon) {
        *self.icon.lock().unwrap() = Some(icon);
    }

    fn focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
    }

    fn on_close(&self, callback: Callback) {
        *self.close_hook.lock().unwrap() = Some(callback);
    }

    fn insert_busy_indicator(&self) -> Arc<dyn BusyIndicator> {
        self.busy.present.store(true, Ordering::SeqCst);
        self.busy.clone()
    }

    fn frame_initialized(&self) -> bool {
        self.readiness_checks.fetch_add(1, Ordering::SeqCst);
        self.frame_ready.load(Ordering::SeqCst)
    }

    fn embedded_frame(&self) -> Option<Arc<dyn EmbeddedFrame>> {
        self.frame.clone().map(|f| f as Arc<dyn EmbeddedFrame>)
    }
}

pub struct FakeWindow {
    pub url: Url,
    pub document_title: Mutex<String>,
    load_hook: Mutex<Option<Box<dyn FnOnce(&dyn BrowserWindow) + Send>>>,
}

impl FakeWindow {
    pub fn finish_load(&self) {
        let hook = self.load_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(self);
        }
    }

    pub fn document_title(&self) -> String {
        self.document_title.lock().unwrap().clone()
    }
}

impl BrowserWindow for FakeWindow {
    fn on_load(&self, callback: Box<dyn FnOnce(&dyn BrowserWindow) + Send + 'static>) {
        *self.load_hook.lock().unwrap() = Some(callback);
    }

    fn set_document_title(&self, title: &str) {
        *self.document_title.lock().unwrap() = title.to_string();
    }
}

pub struct FakeDocking {
    pub anchor: Option<Arc<FakePanel>>,
    pub panels: Mutex<Vec<Arc<FakePanel>>>,
    pub windows: Mutex<Vec<Arc<FakeWindow>>>,
    with_frames: bool,
    counter: AtomicUsize,
}

impl FakeDocking {
    fn build(anchor: bool, with_frames: bool) -> Arc<Self> {
        Arc::new(Self {
            anchor: anchor.then(|| FakePanel::new("properties", false)),
            panels: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
            with_frames,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn new() -> Arc<Self> {
        Self::build(true, true)
    }

    pub fn without_anchor() -> Arc<Self> {
        Self::build(false, true)
    }

    pub fn without_frames() -> Arc<Self> {
        Self::build(true, false)
    }

    pub fn panel(&self, idx: usize) -> Arc<FakePanel> {
        self.panels.lock().unwrap()[idx].clone()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.lock().unwrap().len()
    }

    pub fn window(&self, idx: usize) -> Arc<FakeWindow> {
        self.windows.lock().unwrap()[idx].clone()
    }
}

impl DockingHost for FakeDocking {
    fn find_panels(&self, name: &str) -> Vec<Arc<dyn DockPanel>> {
        match &self.anchor {
            Some(anchor) if name == "properties" => vec![anchor.clone() as Arc<dyn DockPanel>],
            _ => Vec::new(),
        }
    }

    fn add_stacked_panel(
        &self,
        frame_type: &str,
        _anchor: &Arc<dyn DockPanel>,
    ) -> Option<Arc<dyn DockPanel>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let panel = FakePanel::new(&format!("{}_{}", frame_type, n), self.with_frames);
        self.panels.lock().unwrap().push(panel.clone());
        Some(panel as Arc<dyn DockPanel>)
    }

    fn open_window(&self, url: &Url) -> Option<Arc<dyn BrowserWindow>> {
        let window = Arc::new(FakeWindow {
            url: url.clone(),
            document_title: Mutex::new(String::new()),
            load_hook: Mutex::new(None),
        });
        self.windows.lock().unwrap().push(window.clone());
        Some(window as Arc<dyn BrowserWindow>)
    }
}

#[derive(Default)]
pub struct FakeMenuHost {
    pub categories: Mutex<Vec<MenuCategory>>,
    pub entries: Mutex<Vec<MenuEntry>>,
    pub toolbar: Mutex<HashMap<String, bool>>,
}

impl FakeMenuHost {
    pub fn toolbar_state(&self, label: &str) -> Option<bool> {
        self.toolbar.lock().unwrap().get(label).copied()
    }
}

impl MenuHost for FakeMenuHost {
    fn add_menu_category(&self, category: &MenuCategory) {
        self.categories.lock().unwrap().push(category.clone());
    }

    fn add_menus(&self, entries: &[MenuEntry]) {
        self.entries.lock().unwrap().extend_from_slice(entries);
    }

    fn enable_toolbar_button(&self, label: &str, enabled: bool) {
        self.toolbar.lock().unwrap().insert(label.to_string(), enabled);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const BASE_URL: &str = "http://pgadmin.test";

pub fn ancestors() -> NodeAncestors {
    NodeAncestors {
        server_group: Some(NodeRef {
            id: 1,
            label: "Servers".into(),
        }),
        server: Some(ServerRef {
            id: 2,
            label: "local".into(),
            server_type: "pg".into(),
        }),
        database: Some(NodeRef {
            id: 3,
            label: "app".into(),
        }),
        schema: Some(NodeRef {
            id: 4,
            label: "public".into(),
        }),
        view: None,
        catalog: None,
    }
}

pub fn table_node() -> SelectedNode {
    SelectedNode::new("table", 42, "users").with_ancestors(ancestors())
}

pub fn test_config() -> DataGridConfig {
    DataGridConfig::default()
        .base_url(BASE_URL)
        .polling(Duration::from_millis(100), Duration::from_secs(5))
}

pub struct Harness {
    pub grid: DataGrid,
    pub api: Arc<FakeApi>,
    pub alerts: Arc<RecordingAlerts>,
    pub docking: Arc<FakeDocking>,
    pub menus: Arc<FakeMenuHost>,
    pub prefs: watch::Sender<SqlEditorPreferences>,
}

pub fn harness() -> Harness {
    harness_with(FakeDocking::new())
}

pub fn harness_with(docking: Arc<FakeDocking>) -> Harness {
    let api = FakeApi::new();
    let alerts = Arc::new(RecordingAlerts::default());
    let (prefs_tx, prefs_rx) = prefs::fixed(SqlEditorPreferences::default());
    let grid = DataGrid::new(
        &test_config(),
        Collaborators {
            api: api.clone(),
            alerts: alerts.clone(),
            docking: docking.clone(),
            preferences: prefs_rx,
            titles: None,
        },
    )
    .expect("valid config");
    Harness {
        grid,
        api,
        alerts,
        docking,
        menus: Arc::new(FakeMenuHost::default()),
        prefs: prefs_tx,
    }
}

/// Let spawned tasks and a few poll ticks run under paused time
pub async fn settle(ticks: u32) {
    for _ in 0..ticks {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
