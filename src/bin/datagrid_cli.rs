//! Datagrid CLI
//!
//! Exercises a running backend's datagrid endpoints without a browser:
//! validate a filter clause, or create a session, print the URL a panel
//! would load, and close the session again.
//!
//! Usage:
//!   cargo run --features cli --bin datagrid_cli -- \
//!     validate-filter --sid 1 --did 16384 --obj-id 24576 "id > 10"
//!
//!   cargo run --features cli --bin datagrid_cli -- \
//!     open --sgid 1 --sid 1 --did 16384 --obj-type table --obj-id 24576 \
//!     --label public.users --command first
//!
//! The backend is taken from `DATAGRID_BASE_URL` (a `.env` file is honoured)
//! unless `--base-url` is given.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use datagrid_session::api::{DataGridApi, Endpoints, HttpDataGridApi};
use datagrid_session::host::AlertSink;
use datagrid_session::node::{CommandKind, FilterRequest, ObjectId};
use datagrid_session::session::{SessionCreator, SessionEvent, SessionRequest, SessionTarget};
use datagrid_session::telemetry::init_tracing;
use datagrid_session::title::{
    derive_chrome, EscapedTitle, PanelTitleSource, SequentialPanelTitles, TitleMode,
};
use datagrid_session::DataGridConfig;

#[derive(Parser, Debug)]
#[command(name = "datagrid_cli")]
#[command(about = "Probe the datagrid session endpoints of a backend")]
struct Args {
    /// Backend base URL (overrides DATAGRID_BASE_URL)
    #[arg(long, env = "DATAGRID_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the backend whether a filter clause is valid for an object
    ValidateFilter {
        #[arg(long)]
        sid: ObjectId,
        #[arg(long)]
        did: ObjectId,
        #[arg(long)]
        obj_id: ObjectId,
        /// The WHERE-clause text
        filter: String,
    },
    /// Create a data grid session, print its panel URL, then close it
    Open {
        #[arg(long, default_value_t = 1)]
        sgid: ObjectId,
        #[arg(long)]
        sid: ObjectId,
        #[arg(long)]
        did: ObjectId,
        #[arg(long, default_value = "table")]
        obj_type: String,
        #[arg(long)]
        obj_id: ObjectId,
        /// `<namespace>.<object>` label used in the panel title
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, default_value = "pg")]
        server_type: String,
        #[arg(long, value_enum, default_value_t = RowSelection::All)]
        command: RowSelection,
        /// Keep the session open instead of closing it
        #[arg(long)]
        keep: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RowSelection {
    First,
    Last,
    All,
}

impl From<RowSelection> for CommandKind {
    fn from(selection: RowSelection) -> Self {
        match selection {
            RowSelection::First => CommandKind::FirstN,
            RowSelection::Last => CommandKind::LastN,
            RowSelection::All => CommandKind::AllRows,
        }
    }
}

/// Prints alerts to stderr
struct ConsoleAlerts;

impl AlertSink for ConsoleAlerts {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("{} {}", format!("{}:", title).red().bold(), message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let mut config = DataGridConfig::from_env();
    if let Some(base_url) = args.base_url {
        config = config.base_url(base_url);
    }

    let endpoints = Endpoints::new(&config.base_url)
        .with_context(|| format!("invalid base url {}", config.base_url))?;
    let api = Arc::new(HttpDataGridApi::new(config.request_timeout())?);

    match args.command {
        Command::ValidateFilter {
            sid,
            did,
            obj_id,
            filter,
        } => {
            let request = FilterRequest {
                object_type: String::new(),
                server_group_id: 0,
                server_id: sid,
                database_id: did,
                object_id: obj_id,
                command: CommandKind::Filtered,
                filter_text: None,
            };
            let validation = api
                .validate_filter(endpoints.filter_validate(&request), &filter)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if validation.status {
                println!("{} {}", "VALID".green().bold(), filter);
            } else {
                println!("{} {}", "INVALID".red().bold(), validation.result);
                std::process::exit(1);
            }
        }
        Command::Open {
            sgid,
            sid,
            did,
            obj_type,
            obj_id,
            label,
            server_type,
            command,
            keep,
        } => {
            let request = FilterRequest {
                object_type: obj_type,
                server_group_id: sgid,
                server_id: sid,
                database_id: did,
                object_id: obj_id,
                command: command.into(),
                filter_text: None,
            };
            let creator = SessionCreator::new(api.clone(), Arc::new(ConsoleAlerts));
            let session_request = SessionRequest::data_grid(
                endpoints.initialize_datagrid(&request),
                &server_type,
                &label,
            );

            let session = match creator.create(session_request, SessionTarget::Module).await {
                SessionEvent::Created(session) => session,
                SessionEvent::Failed(failure) => bail!("session not created: {}", failure.reason),
            };

            let titles = SequentialPanelTitles::new(config.panel_title_prefix.clone());
            let chrome = derive_chrome(&TitleMode::for_session(&session), &titles.next_title());
            let content_url = endpoints.panel(
                session.session_id,
                session.is_query_tool,
                &EscapedTitle::encode(&chrome.title),
                &session.source_url,
                &session.server_type,
            );

            println!("{:<8} {}", "session".bold(), session.session_id);
            println!("{:<8} {}", "title".bold(), chrome.title);
            println!("{:<8} {}", "url".bold(), content_url);

            if !keep {
                api.close(endpoints.close(session.session_id))
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                println!("{}", "closed".dimmed());
            }
        }
    }

    Ok(())
}
