use std::sync::LazyLock;

use export_logging::{export_debug, export_warn};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ContextSelectors;
use crate::{ExportError, ThreadIdentity};

/// Everything the exporter is told about the page it runs against.
///
/// `state_tid`/`state_title` are the values a live NodeBB page keeps in its
/// client-side state; the DOM snapshot and document title are fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageContext {
    pub url: String,
    pub state_tid: Option<String>,
    pub state_title: Option<String>,
    pub dom_html: Option<String>,
    pub document_title: Option<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, tid: Option<String>, title: Option<String>) -> Self {
        self.state_tid = tid;
        self.state_title = title;
        self
    }

    pub fn with_dom_html(mut self, html: impl Into<String>) -> Self {
        self.dom_html = Some(html.into());
        self
    }

    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }
}

/// API root of the forum: the page URL up to (not including) `/topic/`.
pub fn forum_base_url(url: &str) -> &str {
    match url.split_once("/topic/") {
        Some((base, _)) => base,
        None => url,
    }
}

pub fn resolve_thread_id(ctx: &PageContext) -> Result<String, ExportError> {
    if let Some(tid) = non_empty(ctx.state_tid.as_deref()) {
        return Ok(tid.to_string());
    }
    let path = Url::parse(&ctx.url)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| ctx.url.clone());
    thread_id_from_path(&path)
        .map(str::to_string)
        .ok_or(ExportError::ThreadIdUnresolved)
}

pub fn resolve_title(ctx: &PageContext, selectors: &ContextSelectors) -> String {
    if let Some(title) = non_empty(ctx.state_title.as_deref()) {
        return title.to_string();
    }
    let dom = ctx.dom_html.as_deref().map(Html::parse_document);
    dom.as_ref()
        .and_then(|doc| element_text(doc, &selectors.title_selector))
        .or_else(|| ctx.document_title.as_deref().map(|t| t.trim().to_string()))
        .or_else(|| dom.as_ref().and_then(|doc| element_text(doc, "title")))
        .unwrap_or_default()
}

pub fn resolve_identity(
    ctx: &PageContext,
    selectors: &ContextSelectors,
) -> Result<ThreadIdentity, ExportError> {
    let id = resolve_thread_id(ctx)?;
    let identity = ThreadIdentity {
        id,
        title: resolve_title(ctx, selectors),
        base_url: forum_base_url(&ctx.url).to_string(),
    };
    export_debug!(
        "resolved thread id={} base={} title={:?}",
        identity.id,
        identity.base_url,
        identity.title
    );
    Ok(identity)
}

static TOPIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"topic/(\d+)").expect("topic id pattern is valid"));

/// First `topic/<digits>` occurrence in `path`.
fn thread_id_from_path(path: &str) -> Option<&str> {
    TOPIC_ID
        .captures(path)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

fn element_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = match Selector::parse(selector) {
        Ok(selector) => selector,
        Err(err) => {
            export_warn!("ignoring invalid selector {selector:?}: {err}");
            return None;
        }
    };
    doc.select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
