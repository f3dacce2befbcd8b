//! Context menu and toolbar registration
//!
//! The launcher contributes one query-tool entry plus four view-data entries
//! per supported node type. Entries are plain data; the host re-evaluates
//! [`MenuEntry::is_enabled`] on each selection change and dispatches the
//! entry's [`MenuAction`] back through [`crate::DataGrid::invoke`].

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::host::MenuHost;
use crate::node::{classify, ActionAvailability, CommandKind, SelectedNode, SUPPORTED_VIEW_TYPES};

pub const VIEW_DATA_CATEGORY: &str = "view_data";

pub const TOOLBAR_VIEW_DATA: &str = "View Data";
pub const TOOLBAR_FILTERED_ROWS: &str = "Filtered Rows";
pub const TOOLBAR_QUERY_TOOL: &str = "Query Tool";

/// Where an entry is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Context,
    Object,
    Tools,
}

/// What an entry does when invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ShowDataGrid(CommandKind),
    ShowFilteredRows,
    ShowQueryTool,
}

impl MenuAction {
    /// The availability switch that gates this action
    pub fn enabled_by(self) -> EnablePredicate {
        match self {
            MenuAction::ShowDataGrid(_) | MenuAction::ShowFilteredRows => EnablePredicate::ViewData,
            MenuAction::ShowQueryTool => EnablePredicate::QueryTool,
        }
    }
}

/// Which switch of [`ActionAvailability`] enables the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnablePredicate {
    ViewData,
    QueryTool,
}

impl EnablePredicate {
    pub fn evaluate(self, availability: ActionAvailability) -> bool {
        match self {
            EnablePredicate::ViewData => availability.view_data_enabled,
            EnablePredicate::QueryTool => availability.query_tool_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    pub name: &'static str,
    pub label: &'static str,
    pub priority: u32,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub name: String,
    pub applies_to: Vec<MenuContext>,
    pub node_type: Option<&'static str>,
    pub action: MenuAction,
    pub enable: EnablePredicate,
    pub category: Option<&'static str>,
    pub priority: u32,
    pub label: &'static str,
    pub icon: Option<&'static str>,
}

impl MenuEntry {
    pub fn is_enabled<S: AsRef<str>>(
        &self,
        node: Option<&SelectedNode>,
        unsupported_query_types: &[S],
    ) -> bool {
        self.enable
            .evaluate(classify(node, unsupported_query_types))
    }
}

pub fn view_data_category() -> MenuCategory {
    MenuCategory {
        name: VIEW_DATA_CATEGORY,
        label: "View/Edit Data",
        priority: 100,
        icon: "",
    }
}

/// The full entry table
pub fn menu_entries() -> Vec<MenuEntry> {
    let mut entries = vec![MenuEntry {
        name: "query_tool".to_string(),
        applies_to: vec![MenuContext::Tools],
        node_type: None,
        action: MenuAction::ShowQueryTool,
        enable: EnablePredicate::QueryTool,
        category: None,
        priority: 1,
        label: "Query Tool",
        icon: Some("fa fa-bolt"),
    }];

    let view_entries: [(&str, MenuAction, u32, &'static str); 4] = [
        ("view_all_rows", MenuAction::ShowDataGrid(CommandKind::AllRows), 101, "All Rows"),
        ("view_first_100_rows", MenuAction::ShowDataGrid(CommandKind::FirstN), 102, "First 100 Rows"),
        ("view_last_100_rows", MenuAction::ShowDataGrid(CommandKind::LastN), 103, "Last 100 Rows"),
        ("view_filtered_rows", MenuAction::ShowFilteredRows, 104, "Filtered Rows..."),
    ];

    for node_type in SUPPORTED_VIEW_TYPES {
        for (prefix, action, priority, label) in view_entries {
            entries.push(MenuEntry {
                name: format!("{}_context_{}", prefix, node_type),
                applies_to: vec![MenuContext::Context, MenuContext::Object],
                node_type: Some(node_type),
                action,
                enable: EnablePredicate::ViewData,
                category: Some(VIEW_DATA_CATEGORY),
                priority,
                label,
                icon: None,
            });
        }
    }
    entries
}

/// Registers the launcher's menus once and keeps the toolbar in sync with
/// the selection.
#[derive(Debug)]
pub struct MenuRegistrar {
    registered: AtomicBool,
    unsupported_query_types: Vec<String>,
}

impl MenuRegistrar {
    pub fn new(unsupported_query_types: Vec<String>) -> Self {
        Self {
            registered: AtomicBool::new(false),
            unsupported_query_types,
        }
    }

    /// Register category and entries with the host. Returns `false` when
    /// this registrar already did.
    pub fn register(&self, host: &dyn MenuHost) -> bool {
        if self.registered.swap(true, Ordering::SeqCst) {
            debug!("Datagrid menus already registered");
            return false;
        }
        host.add_menu_category(&view_data_category());
        let entries = menu_entries();
        debug!(count = entries.len(), "Registering datagrid menus");
        host.add_menus(&entries);
        true
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn availability(&self, node: Option<&SelectedNode>) -> ActionAvailability {
        classify(node, self.unsupported_query_types.as_slice())
    }

    /// Re-evaluate the toolbar for a new selection
    pub fn on_selection_changed(
        &self,
        node: Option<&SelectedNode>,
        host: &dyn MenuHost,
    ) -> ActionAvailability {
        let availability = self.availability(node);
        host.enable_toolbar_button(TOOLBAR_VIEW_DATA, availability.view_data_enabled);
        host.enable_toolbar_button(TOOLBAR_FILTERED_ROWS, availability.view_data_enabled);
        host.enable_toolbar_button(TOOLBAR_QUERY_TOOL, availability.query_tool_enabled);
        availability
    }
}
