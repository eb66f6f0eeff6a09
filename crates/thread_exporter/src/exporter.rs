use export_logging::{export_error, export_info};
use serde::{Deserialize, Serialize};

use crate::client::{ForumClient, ReqwestForumClient};
use crate::config::ExporterConfig;
use crate::convert::ForumMarkdownConverter;
use crate::fetch::ThreadFetcher;
use crate::identity::{resolve_identity, PageContext};
use crate::normalize::normalize;
use crate::{ExportError, ThreadExport};

/// Action identifier the trigger boundary answers to.
pub const EXPORT_ACTION: &str = "exportNodeBBThread";

pub struct ThreadExporter<C> {
    fetcher: ThreadFetcher<C>,
    config: ExporterConfig,
}

impl ThreadExporter<ReqwestForumClient> {
    pub fn from_config(config: ExporterConfig) -> Result<Self, ExportError> {
        let client = ReqwestForumClient::new(&config.fetch)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C: ForumClient> ThreadExporter<C> {
    pub fn with_client(client: C, config: ExporterConfig) -> Self {
        Self {
            fetcher: ThreadFetcher::new(client),
            config,
        }
    }

    /// Resolves the thread behind `ctx`, downloads all of its pages and
    /// returns the surviving posts as Markdown.
    pub async fn export(&self, ctx: &PageContext) -> Result<ThreadExport, ExportError> {
        export_info!("exporting thread from {}", ctx.url);
        let identity = resolve_identity(ctx, &self.config.selectors)?;
        let converter =
            ForumMarkdownConverter::new(&self.config.converter, Some(identity.base_url.as_str()))?;

        let raw_posts = self.fetcher.fetch_raw_posts(&identity).await?;
        let posts = normalize(&raw_posts, &converter);
        export_info!(
            "thread {}: kept {} of {} post(s)",
            identity.id,
            posts.len(),
            raw_posts.len()
        );

        Ok(ThreadExport {
            title: identity.title,
            posts,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub action: String,
    #[serde(default)]
    pub context: PageContext,
}

impl ExportRequest {
    pub fn export(context: PageContext) -> Self {
        Self {
            action: EXPORT_ACTION.to_string(),
            context,
        }
    }
}

/// `{"success":true,"data":{..}}` or `{"success":false,"error":".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ThreadExport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: ThreadExport) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Runs one export for a trigger request. Requests for other actions are not
/// answered (`None`); failures never escape and come back as `success: false`.
pub async fn handle_request<C: ForumClient>(
    exporter: &ThreadExporter<C>,
    request: &ExportRequest,
) -> Option<ExportResponse> {
    if request.action != EXPORT_ACTION {
        return None;
    }
    let response = match exporter.export(&request.context).await {
        Ok(data) => ExportResponse::success(data),
        Err(err) => {
            export_error!("error exporting thread ({}): {}", err.kind(), err);
            ExportResponse::failure(err.to_string())
        }
    };
    Some(response)
}
