// Remote task source

use crate::error::NetworkError;
use serde::Deserialize;
use tracing::{debug, info};

/// Base URL of the remote task service
pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// A task as delivered by the remote service
///
/// `id` and `user_id` belong to the remote service and are never reused as
/// local identifiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteTask {
    pub id: i64,
    #[serde(rename = "todo")]
    pub name: String,
    #[serde(rename = "completed")]
    pub is_completed: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Paginated envelope around a page of remote tasks
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTaskPage {
    #[serde(rename = "todos")]
    pub tasks: Vec<RemoteTask>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Anything that can hand over the remote task list
pub trait TaskSource: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<RemoteTask>, NetworkError>;
}

/// Blocking HTTP client for `GET {base}/todos`
pub struct HttpTaskSource {
    agent: ureq::Agent,
    url: String,
}

impl HttpTaskSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            url: format!("{}/todos", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpTaskSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TaskSource for HttpTaskSource {
    fn fetch_all(&self) -> Result<Vec<RemoteTask>, NetworkError> {
        debug!(url = %self.url, "Fetching remote tasks");

        let response = self
            .agent
            .get(&self.url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => NetworkError::Status {
                    url: self.url.clone(),
                    code,
                },
                ureq::Error::Transport(transport) => NetworkError::Transport {
                    url: self.url.clone(),
                    message: transport.to_string(),
                },
            })?;

        let page: RemoteTaskPage = response.into_json().map_err(NetworkError::Decode)?;
        info!(
            count = page.tasks.len(),
            total = page.total,
            skip = page.skip,
            limit = page.limit,
            "Fetched remote tasks"
        );

        Ok(page.tasks)
    }
}
