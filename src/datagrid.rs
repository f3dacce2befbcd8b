//! The launcher facade
//!
//! [`DataGrid`] is constructed once at start-up from a [`DataGridConfig`] and
//! the host's [`Collaborators`]. It owns the single filter dialog and the
//! menu registrar, and chains each invocation through validation, session
//! creation and panel launch.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{DataGridApi, Endpoints};
use crate::config::DataGridConfig;
use crate::error::{DataGridError, Result};
use crate::filter::{FilterContext, FilterDialog, FilterOutcome, DIALOG_TITLE};
use crate::host::{AlertSink, DockingHost, MenuHost};
use crate::menu::{EnablePredicate, MenuAction, MenuRegistrar};
use crate::node::{grid_title, ActionAvailability, CommandKind, FilterRequest, SelectedNode};
use crate::panel::{LaunchedPanel, PanelOrchestrator, PollSettings};
use crate::prefs::{EditorSettings, PreferenceWatch};
use crate::session::{SessionCreator, SessionEvent, SessionRequest, SessionTarget};
use crate::title::{PanelTitleSource, SequentialPanelTitles};

const DATA_GRID_ERROR: &str = "Data Grid Error";
const QUERY_TOOL_ERROR: &str = "Query Tool Error";
const NO_OBJECT_SELECTED: &str = "No object selected.";

/// Host-provided services
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn DataGridApi>,
    pub alerts: Arc<dyn AlertSink>,
    pub docking: Arc<dyn DockingHost>,
    pub preferences: PreferenceWatch,
    /// Defaults to [`SequentialPanelTitles`] with the configured prefix
    pub titles: Option<Arc<dyn PanelTitleSource>>,
}

pub struct DataGrid {
    endpoints: Endpoints,
    alerts: Arc<dyn AlertSink>,
    api: Arc<dyn DataGridApi>,
    preferences: PreferenceWatch,
    creator: SessionCreator,
    orchestrator: PanelOrchestrator,
    filter: FilterDialog,
    menus: MenuRegistrar,
}

impl DataGrid {
    pub fn new(config: &DataGridConfig, collaborators: Collaborators) -> Result<Self> {
        let endpoints = Endpoints::new(&config.base_url)
            .map_err(|e| DataGridError::Config(format!("base_url: {}", e)))?;
        let Collaborators {
            api,
            alerts,
            docking,
            preferences,
            titles,
        } = collaborators;
        let titles = titles.unwrap_or_else(|| {
            Arc::new(SequentialPanelTitles::new(config.panel_title_prefix.clone()))
        });

        let poll = PollSettings {
            interval: config.poll_interval(),
            timeout: config.frame_ready_timeout(),
        };

        Ok(Self {
            creator: SessionCreator::new(Arc::clone(&api), Arc::clone(&alerts)),
            orchestrator: PanelOrchestrator::new(
                Arc::clone(&api),
                docking,
                Arc::clone(&alerts),
                titles,
                endpoints.clone(),
                poll,
            ),
            filter: FilterDialog::new(
                Arc::clone(&api),
                Arc::clone(&alerts),
                config.filter_focus_delay(),
            ),
            menus: MenuRegistrar::new(config.unsupported_query_types.clone()),
            endpoints,
            alerts,
            api,
            preferences,
        })
    }

    /// Register menus with the host. Safe to call more than once.
    pub fn init(&self, menu_host: &dyn MenuHost) -> bool {
        self.menus.register(menu_host)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn filter_dialog(&self) -> &FilterDialog {
        &self.filter
    }

    pub fn on_selection_changed(
        &self,
        node: Option<&SelectedNode>,
        menu_host: &dyn MenuHost,
    ) -> ActionAvailability {
        self.menus.on_selection_changed(node, menu_host)
    }

    /// Dispatch a menu entry's action. Actions the classifier disables for
    /// `node` fail with [`DataGridError::ActionUnavailable`] before any request.
    pub async fn invoke(
        &self,
        action: MenuAction,
        node: Option<&SelectedNode>,
    ) -> Result<Option<LaunchedPanel>> {
        if let Some(node) = node {
            self.require_enabled(node, action.enabled_by())?;
        }
        match action {
            MenuAction::ShowDataGrid(command) => self.show_data_grid(node, command).await,
            MenuAction::ShowFilteredRows => self.show_filtered_rows(node).await.map(|_| None),
            MenuAction::ShowQueryTool => self.show_query_tool(node, "", "").await,
        }
    }

    /// Open the data grid for a table-like node.
    ///
    /// [`CommandKind::Filtered`] opens the filter dialog instead; the session
    /// is created once the filter is confirmed.
    pub async fn show_data_grid(
        &self,
        node: Option<&SelectedNode>,
        command: CommandKind,
    ) -> Result<Option<LaunchedPanel>> {
        if command == CommandKind::Filtered {
            return self.show_filtered_rows(node).await.map(|_| None);
        }
        let node = self.require_node(node, DATA_GRID_ERROR)?;
        self.require_enabled(node, EnablePredicate::ViewData)?;
        let request = self.require_request(node, command)?;
        let session_request = SessionRequest::data_grid(
            self.endpoints.initialize_datagrid(&request),
            node.server_type(),
            &grid_title(node),
        );
        self.create_transaction(session_request, SessionTarget::Module)
            .await
    }

    /// Fetch the filter editor markup and open the filter dialog
    pub async fn show_filtered_rows(&self, node: Option<&SelectedNode>) -> Result<()> {
        let node = self.require_node(node, DATA_GRID_ERROR)?;
        self.require_enabled(node, EnablePredicate::ViewData)?;
        let request = self.require_request(node, CommandKind::Filtered)?;
        let context = FilterContext {
            session_url: self.endpoints.initialize_datagrid(&request),
            validate_url: self.endpoints.filter_validate(&request),
            server_type: node.server_type().to_string(),
            grid_title: grid_title(node),
            request,
        };

        let markup = match self.api.filter_markup(self.endpoints.filter()).await {
            Ok(markup) => markup,
            Err(e) => {
                self.alerts.alert(DIALOG_TITLE, &e.user_message());
                return Err(e.into());
            }
        };
        let editor = EditorSettings::from(&*self.preferences.borrow());
        if !self.filter.open(context, markup, editor) {
            return Err(DataGridError::FilterBusy);
        }
        debug!(object_id = node.id, "Filter dialog opened");
        Ok(())
    }

    /// OK pressed in the filter dialog
    pub async fn confirm_filter(&self) -> Result<Option<LaunchedPanel>> {
        match self.filter.confirm(&self.creator).await {
            FilterOutcome::Submitted(event) => self.launch(event),
            _ => Ok(None),
        }
    }

    /// Cancel pressed in the filter dialog
    pub fn cancel_filter(&self) -> bool {
        self.filter.cancel()
    }

    /// Open an ad-hoc (or script) query tool for the selected node's server.
    ///
    /// Not gated by the classifier: script query tools are opened from
    /// other modules on any node below a server. Menu dispatch goes through
    /// [`DataGrid::invoke`], which is.
    pub async fn show_query_tool(
        &self,
        node: Option<&SelectedNode>,
        source_url: &str,
        script_label: &str,
    ) -> Result<Option<LaunchedPanel>> {
        let node = self.require_node(node, QUERY_TOOL_ERROR)?;
        let ancestors = &node.ancestors;
        let Some(server) = ancestors.server.as_ref() else {
            self.alerts.alert(QUERY_TOOL_ERROR, "Please select a server or a child node.");
            return Err(DataGridError::MissingContext("server"));
        };
        let server_group_id = ancestors.server_group.as_ref().map(|g| g.id).unwrap_or_default();
        let url = self.endpoints.initialize_query_tool(
            server_group_id,
            server.id,
            ancestors.database.as_ref().map(|d| d.id),
        );
        let request = SessionRequest::query_tool(url, &server.server_type, source_url, script_label);
        self.create_transaction(request, SessionTarget::Module)
            .await
    }

    /// Create a session and hand it to its consumer. For
    /// [`SessionTarget::Module`] a panel is launched; delegates receive the
    /// session themselves and `Ok(None)` is returned.
    pub async fn create_transaction(
        &self,
        request: SessionRequest,
        target: SessionTarget,
    ) -> Result<Option<LaunchedPanel>> {
        let to_module = matches!(target, SessionTarget::Module);
        let event = self.creator.create(request, target).await;
        if to_module {
            self.launch(event)
        } else {
            match event {
                SessionEvent::Created(_) => Ok(None),
                SessionEvent::Failed(failure) => Err(DataGridError::SessionFailed(failure.reason)),
            }
        }
    }

    fn launch(&self, event: SessionEvent) -> Result<Option<LaunchedPanel>> {
        match event {
            SessionEvent::Created(session) => {
                let new_tab = self.preferences.borrow().new_browser_tab;
                match self.orchestrator.launch(session, new_tab) {
                    Ok(panel) => Ok(Some(panel)),
                    Err(e) => {
                        self.alerts.alert(DATA_GRID_ERROR, &e.to_string());
                        Err(e)
                    }
                }
            }
            SessionEvent::Failed(failure) => Err(DataGridError::SessionFailed(failure.reason)),
        }
    }

    fn require_node<'a>(
        &self,
        node: Option<&'a SelectedNode>,
        error_title: &str,
    ) -> Result<&'a SelectedNode> {
        node.ok_or_else(|| {
            self.alerts.alert(error_title, NO_OBJECT_SELECTED);
            DataGridError::NoObjectSelected
        })
    }

    fn require_enabled(&self, node: &SelectedNode, predicate: EnablePredicate) -> Result<()> {
        if predicate.evaluate(self.menus.availability(Some(node))) {
            return Ok(());
        }
        debug!(node_type = %node.node_type, ?predicate, "Action disabled for selection");
        Err(DataGridError::ActionUnavailable(node.node_type.clone()))
    }

    fn require_request(&self, node: &SelectedNode, command: CommandKind) -> Result<FilterRequest> {
        FilterRequest::for_node(node, command).map_err(|e| {
            info!(node_type = %node.node_type, error = %e, "Datagrid request aborted");
            self.alerts.alert(DATA_GRID_ERROR, &e.to_string());
            e
        })
    }
}
