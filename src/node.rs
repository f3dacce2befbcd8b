//! Selected catalog nodes and action availability
//!
//! The tree collaborator hands us a [`SelectedNode`] on every selection
//! change. [`classify`] turns it into the pair of switches that drive the
//! "View Data" and "Query Tool" affordances. [`FilterRequest::for_node`]
//! captures the identifiers a data-grid session request needs.

use serde::{Deserialize, Serialize};

use crate::error::DataGridError;

/// Node types that can be opened in the data grid.
pub const SUPPORTED_VIEW_TYPES: [&str; 6] = [
    "table",
    "view",
    "mview",
    "foreign_table",
    "catalog_object",
    "partition",
];

/// Node types on which the query tool is not offered, unless configured otherwise.
pub const DEFAULT_UNSUPPORTED_QUERY_TYPES: [&str; 9] = [
    "server_group",
    "server",
    "coll-tablespace",
    "tablespace",
    "coll-role",
    "role",
    "coll-resource_group",
    "resource_group",
    "coll-database",
];

pub type ObjectId = i64;

/// An ancestor in the tree hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: ObjectId,
    pub label: String,
}

/// The server ancestor also carries the server flavour (`pg`, `ppas`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRef {
    pub id: ObjectId,
    pub label: String,
    #[serde(default)]
    pub server_type: String,
}

/// Hierarchy above the selected node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAncestors {
    pub server_group: Option<NodeRef>,
    pub server: Option<ServerRef>,
    pub database: Option<NodeRef>,
    #[serde(default)]
    pub schema: Option<NodeRef>,
    #[serde(default)]
    pub view: Option<NodeRef>,
    #[serde(default)]
    pub catalog: Option<NodeRef>,
}

/// Node selected in the catalog tree. Read-only for this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: ObjectId,
    #[serde(default)]
    pub label: String,
    /// Only meaningful for `database` nodes.
    #[serde(default)]
    pub allows_connection: bool,
    #[serde(default)]
    pub ancestors: NodeAncestors,
}

impl SelectedNode {
    pub fn new(node_type: impl Into<String>, id: ObjectId, label: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            id,
            label: label.into(),
            allows_connection: false,
            ancestors: NodeAncestors::default(),
        }
    }

    pub fn with_ancestors(mut self, ancestors: NodeAncestors) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn allowing_connection(mut self, allows: bool) -> Self {
        self.allows_connection = allows;
        self
    }

    /// Server flavour of the owning server, empty when unknown
    pub fn server_type(&self) -> &str {
        self.ancestors
            .server
            .as_ref()
            .map(|s| s.server_type.as_str())
            .unwrap_or("")
    }
}

/// Which launcher actions apply to the current selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionAvailability {
    pub view_data_enabled: bool,
    pub query_tool_enabled: bool,
}

pub fn view_data_enabled(node: Option<&SelectedNode>) -> bool {
    node.is_some_and(|n| SUPPORTED_VIEW_TYPES.contains(&n.node_type.as_str()))
}

pub fn query_tool_enabled<S: AsRef<str>>(node: Option<&SelectedNode>, unsupported: &[S]) -> bool {
    let Some(node) = node else {
        return false;
    };
    if unsupported.iter().any(|t| t.as_ref() == node.node_type) {
        return false;
    }
    node.node_type != "database" || node.allows_connection
}

/// Evaluate both switches for a selection. Absent input disables everything.
pub fn classify<S: AsRef<str>>(
    node: Option<&SelectedNode>,
    unsupported_query_types: &[S],
) -> ActionAvailability {
    ActionAvailability {
        view_data_enabled: view_data_enabled(node),
        query_tool_enabled: query_tool_enabled(node, unsupported_query_types),
    }
}

/// Label of the schema, view or catalog that owns the object
pub fn namespace_name(ancestors: &NodeAncestors) -> &str {
    ancestors
        .schema
        .as_ref()
        .or(ancestors.view.as_ref())
        .or(ancestors.catalog.as_ref())
        .map(|n| n.label.as_str())
        .unwrap_or("")
}

/// `<namespace>.<object>` as shown in data grid titles
pub fn grid_title(node: &SelectedNode) -> String {
    format!("{}.{}", namespace_name(&node.ancestors), node.label)
}

/// Which rows a data-grid session should fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    FirstN,
    LastN,
    AllRows,
    Filtered,
}

impl CommandKind {
    /// Numeric id used in the initialize URL
    pub fn wire_id(self) -> u8 {
        match self {
            CommandKind::FirstN => 1,
            CommandKind::LastN => 2,
            CommandKind::AllRows => 3,
            CommandKind::Filtered => 4,
        }
    }
}

/// Identifiers for one data-grid session request. Built at invocation time
/// and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub object_type: String,
    pub server_group_id: ObjectId,
    pub server_id: ObjectId,
    pub database_id: ObjectId,
    pub object_id: ObjectId,
    pub command: CommandKind,
    pub filter_text: Option<String>,
}

impl FilterRequest {
    /// Capture the identifiers of `node`, checking that it sits under a
    /// server, a database and a schema/view/catalog.
    pub fn for_node(node: &SelectedNode, command: CommandKind) -> Result<Self, DataGridError> {
        let a = &node.ancestors;
        let server = a
            .server
            .as_ref()
            .ok_or(DataGridError::MissingContext("server"))?;
        let database = a
            .database
            .as_ref()
            .ok_or(DataGridError::MissingContext("database"))?;
        if a.schema.is_none() && a.view.is_none() && a.catalog.is_none() {
            return Err(DataGridError::MissingContext("schema"));
        }
        let server_group_id = a.server_group.as_ref().map(|g| g.id).unwrap_or_default();

        Ok(Self {
            object_type: node.node_type.clone(),
            server_group_id,
            server_id: server.id,
            database_id: database.id,
            object_id: node.id,
            command,
            filter_text: None,
        })
    }

    /// Attach the validated filter clause. Only `Filtered` requests carry one.
    pub fn with_filter(mut self, text: impl Into<String>) -> Self {
        if self.command == CommandKind::Filtered {
            self.filter_text = Some(text.into());
        }
        self
    }
}
