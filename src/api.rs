//! API client for the datagrid backend
//!
//! [`DataGridApi`] is the only boundary between the launcher and the server.
//! [`HttpDataGridApi`] is the reqwest implementation; tests substitute their
//! own. [`Endpoints`] builds every URL the launcher talks to.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::node::{FilterRequest, ObjectId};
use crate::title::EscapedTitle;

/// URL prefix of the datagrid blueprint
const PREFIX: &str = "datagrid";

pub type Result<T> = std::result::Result<T, ApiError>;

/// `data` payload of a successful initialize call
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TransactionData {
    #[serde(rename = "gridTransId", alias = "sessionId")]
    pub session_id: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of validating a filter clause
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FilterValidation {
    pub status: bool,
    #[serde(default)]
    pub result: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[async_trait]
pub trait DataGridApi: Send + Sync {
    /// Create an execution session. `body` is already JSON encoded; `None`
    /// sends no body at all.
    async fn initialize(&self, url: Url, body: Option<String>) -> Result<TransactionData>;

    /// Validate a raw filter clause against the target object
    async fn validate_filter(&self, url: Url, filter: &str) -> Result<FilterValidation>;

    /// HTML fragment holding the filter editor field
    async fn filter_markup(&self, url: Url) -> Result<String>;

    /// Tear down a session. Callers ignore the outcome.
    async fn close(&self, url: Url) -> Result<()>;
}

/// Builds datagrid URLs under a base URL
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self { base })
    }

    fn build<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(PREFIX).extend(segments);
        }
        url
    }

    /// `initialize/datagrid/{cmd}/{obj_type}/{sgid}/{sid}/{did}/{obj_id}`
    pub fn initialize_datagrid(&self, req: &FilterRequest) -> Url {
        self.build([
            "initialize".to_string(),
            "datagrid".to_string(),
            req.command.wire_id().to_string(),
            req.object_type.clone(),
            req.server_group_id.to_string(),
            req.server_id.to_string(),
            req.database_id.to_string(),
            req.object_id.to_string(),
        ])
    }

    /// `initialize/query_tool/{sgid}/{sid}[/{did}]`
    pub fn initialize_query_tool(
        &self,
        server_group_id: ObjectId,
        server_id: ObjectId,
        database_id: Option<ObjectId>,
    ) -> Url {
        let mut segments = vec![
            "initialize".to_string(),
            "query_tool".to_string(),
            server_group_id.to_string(),
            server_id.to_string(),
        ];
        segments.extend(database_id.map(|did| did.to_string()));
        self.build(segments)
    }

    /// `filter/validate/{sid}/{did}/{obj_id}`
    pub fn filter_validate(&self, req: &FilterRequest) -> Url {
        self.build([
            "filter".to_string(),
            "validate".to_string(),
            req.server_id.to_string(),
            req.database_id.to_string(),
            req.object_id.to_string(),
        ])
    }

    pub fn filter(&self) -> Url {
        self.build(["filter"])
    }

    /// `close/{trans_id}`
    pub fn close(&self, session_id: u64) -> Url {
        self.build(["close".to_string(), session_id.to_string()])
    }

    /// Content URL loaded into a panel's frame or a new window
    pub fn panel(
        &self,
        session_id: u64,
        is_query_tool: bool,
        title: &EscapedTitle,
        source_url: &str,
        server_type: &str,
    ) -> Url {
        let mut url = self.build([
            "panel".to_string(),
            session_id.to_string(),
            is_query_tool.to_string(),
            title.title.clone(),
        ]);
        url.query_pairs_mut()
            .append_pair("query_url", source_url)
            .append_pair("server_type", server_type)
            .append_pair("fslashes", &title.slash_locations());
        url
    }
}

/// Append the flag that makes the backend discard a prior session on the same URL
pub fn with_recreate_flag(mut url: Url) -> Url {
    url.query_pairs_mut().append_pair("recreate", "1");
    url
}

/// reqwest-backed [`DataGridApi`]
#[derive(Clone)]
pub struct HttpDataGridApi {
    client: reqwest::Client,
}

impl HttpDataGridApi {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let text = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl DataGridApi for HttpDataGridApi {
    async fn initialize(&self, url: Url, body: Option<String>) -> Result<TransactionData> {
        debug!(%url, has_body = body.is_some(), "POST initialize");
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        let response = Self::check(request.send().await?).await?;
        Self::json(response).await
    }

    async fn validate_filter(&self, url: Url, filter: &str) -> Result<FilterValidation> {
        debug!(%url, "POST filter validate");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(filter)?)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::json(response).await
    }

    async fn filter_markup(&self, url: Url) -> Result<String> {
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.text().await?)
    }

    async fn close(&self, url: Url) -> Result<()> {
        debug!(%url, "DELETE session");
        Self::check(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}
