//! Datagrid session launcher
//!
//! Decides which data-viewing actions a catalog selection allows, negotiates
//! server-side execution sessions (optionally behind a validated row
//! filter), and binds each session to a docked panel or browser window once
//! the panel's embedded frame is ready.
//!
//! ```text
//! selection ─▶ node::classify ─▶ menu (enable/disable)
//!                                   │ invoke
//!                                   ▼
//!                    filter::FilterDialog (optional)
//!                                   │
//!                                   ▼
//!                     session::SessionCreator ─▶ SessionEvent
//!                                   │
//!                                   ▼
//!                     panel::PanelOrchestrator ─▶ docked panel / window
//! ```
//!
//! The host UI is reached only through the traits in [`host`]; the backend
//! only through [`api::DataGridApi`].

pub mod api;
pub mod config;
pub mod datagrid;
pub mod error;
pub mod filter;
pub mod host;
pub mod menu;
pub mod node;
pub mod panel;
pub mod prefs;
pub mod session;
pub mod telemetry;
pub mod title;

pub use api::{DataGridApi, Endpoints, HttpDataGridApi};
pub use config::DataGridConfig;
pub use datagrid::{Collaborators, DataGrid};
pub use error::{ApiError, DataGridError};
pub use filter::{FilterDialog, FilterOutcome, FilterState};
pub use menu::{MenuAction, MenuRegistrar};
pub use node::{classify, ActionAvailability, CommandKind, SelectedNode};
pub use panel::{FrameLoad, LaunchedPanel, PanelOrchestrator};
pub use session::{Session, SessionCreator, SessionEvent, SessionRequest, SessionTarget};
pub use title::{derive_chrome, EscapedTitle, PanelChrome, PanelIcon, TitleMode};
