use export_logging::export_debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::FetchSettings;
use crate::{ExportError, Pagination, PaginationResponse, TopicPage};

/// The two read-only NodeBB endpoints the exporter needs.
#[async_trait::async_trait]
pub trait ForumClient: Send + Sync {
    async fn pagination(&self, base_url: &str, tid: &str) -> Result<Pagination, ExportError>;

    async fn page(&self, base_url: &str, tid: &str, page: u32) -> Result<TopicPage, ExportError>;
}

pub fn pagination_url(base_url: &str, tid: &str) -> String {
    format!("{base_url}/api/topic/pagination/{tid}")
}

pub fn page_url(base_url: &str, tid: &str, page: u32) -> String {
    format!("{base_url}/api/topic/{tid}?page={page}")
}

#[derive(Debug, Clone)]
pub struct ReqwestForumClient {
    client: reqwest::Client,
}

impl ReqwestForumClient {
    pub fn new(settings: &FetchSettings) -> Result<Self, ExportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|err| ExportError::Client(err.to_string()))?;
        Ok(Self { client })
    }

    /// Issues the GET and hands back the status and body; status checking is
    /// left to the caller since each endpoint reports it differently.
    async fn get(&self, url: &str) -> Result<(StatusCode, String), ExportError> {
        export_debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| transport_error(url, &err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(url, &err))?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl ForumClient for ReqwestForumClient {
    async fn pagination(&self, base_url: &str, tid: &str) -> Result<Pagination, ExportError> {
        let url = pagination_url(base_url, tid);
        let (status, body) = self.get(&url).await?;
        if !status.is_success() {
            return Err(ExportError::Pagination {
                status: status.to_string(),
            });
        }
        let response: PaginationResponse = decode_json(&url, &body)?;
        Ok(response.pagination)
    }

    async fn page(&self, base_url: &str, tid: &str, page: u32) -> Result<TopicPage, ExportError> {
        let url = page_url(base_url, tid, page);
        let (status, body) = self.get(&url).await?;
        if !status.is_success() {
            return Err(ExportError::Page {
                page,
                status: status.to_string(),
            });
        }
        decode_json(&url, &body)
    }
}

fn decode_json<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ExportError> {
    serde_json::from_str(body).map_err(|err| ExportError::InvalidResponse {
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn transport_error(url: &str, err: &reqwest::Error) -> ExportError {
    ExportError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
