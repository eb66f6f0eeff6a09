//! Thread exporter: NodeBB topic API to normalized Markdown posts.
mod client;
mod config;
mod convert;
mod error;
mod exporter;
mod fetch;
mod filename;
mod identity;
mod normalize;
mod persist;
mod rules;
mod types;

pub use client::{page_url, pagination_url, ForumClient, ReqwestForumClient};
pub use config::{
    ContextSelectors, ConverterConfig, ExporterConfig, FetchSettings, DEFAULT_MENTION_CLASS,
    DEFAULT_TITLE_SELECTOR, ENGLISH_CITATION_PATTERN, HEBREW_CITATION_PATTERN,
};
pub use convert::{Converter, ForumMarkdownConverter};
pub use error::{ExportError, FailureKind};
pub use exporter::{handle_request, ExportRequest, ExportResponse, ThreadExporter, EXPORT_ACTION};
pub use fetch::ThreadFetcher;
pub use filename::export_filename;
pub use identity::{forum_base_url, resolve_identity, resolve_thread_id, resolve_title, PageContext};
pub use normalize::normalize;
pub use persist::{JsonExportWriter, PersistError};
pub use rules::{element_attr, has_class, ConversionRule, ImageRule, MentionRule, QuoteRule};
pub use types::{
    NormalizedPost, Pagination, PaginationResponse, PostId, RawPost, RawUser, ThreadExport,
    ThreadIdentity, TopicPage,
};
