//! Seams to the host UI
//!
//! The launcher never renders anything itself. Alerts, the docking layout,
//! embedded frames, browser windows and the menu/toolbar registry are
//! provided by the embedding application through these traits.

use std::sync::Arc;

use url::Url;

use crate::menu::{MenuCategory, MenuEntry};
use crate::title::PanelIcon;

/// Modal alerts
pub trait AlertSink: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// One-shot callback invoked by the host
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Busy spinner overlay inside a panel's content area
pub trait BusyIndicator: Send + Sync {
    fn remove(&self);
}

/// Sub-frame embedded in a docked panel
pub trait EmbeddedFrame: Send + Sync {
    /// Register a one-shot callback for when the loaded content finishes loading
    fn on_loaded(&self, callback: Callback);

    fn open_url(&self, url: &Url);
}

/// A panel in the docking layout
pub trait DockPanel: Send + Sync {
    /// Host-assigned identifier of the panel element
    fn dom_id(&self) -> String;

    fn set_title(&self, markup: &str);

    fn set_icon(&self, icon: PanelIcon);

    fn focus(&self);

    /// Register a one-shot callback for when the user closes the panel
    fn on_close(&self, callback: Callback);

    fn insert_busy_indicator(&self) -> Arc<dyn BusyIndicator>;

    /// Set by the embedded frame's own bootstrap, independently of us
    fn frame_initialized(&self) -> bool;

    fn embedded_frame(&self) -> Option<Arc<dyn EmbeddedFrame>>;
}

/// A top-level browser window or tab
pub trait BrowserWindow: Send + Sync {
    /// Register a one-shot callback for when the window's document has loaded
    fn on_load(&self, callback: Box<dyn FnOnce(&dyn BrowserWindow) + Send + 'static>);

    fn set_document_title(&self, title: &str);
}

/// The docking layout and window opener
pub trait DockingHost: Send + Sync {
    /// Existing panels registered under `name`
    fn find_panels(&self, name: &str) -> Vec<Arc<dyn DockPanel>>;

    /// Create a panel of `frame_type` stacked with `anchor`
    fn add_stacked_panel(
        &self,
        frame_type: &str,
        anchor: &Arc<dyn DockPanel>,
    ) -> Option<Arc<dyn DockPanel>>;

    fn open_window(&self, url: &Url) -> Option<Arc<dyn BrowserWindow>>;
}

/// Context menu and toolbar registry of the host browser
pub trait MenuHost: Send + Sync {
    fn add_menu_category(&self, category: &MenuCategory);

    fn add_menus(&self, entries: &[MenuEntry]);

    fn enable_toolbar_button(&self, label: &str, enabled: bool);
}
