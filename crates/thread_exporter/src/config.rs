use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Citation line NodeBB prepends to quoted replies on Hebrew installs:
/// `@user כתב ב<topic>:`.
pub const HEBREW_CITATION_PATTERN: &str = r"@\S+\s+כתב\s+ב.+:";
/// Same citation line on English installs: `@user said in <topic>:`.
pub const ENGLISH_CITATION_PATTERN: &str = r"@\S+\s+(?:said|wrote)\s+in\s+.+:";
/// Class NodeBB's mentions plugin puts on `@user` anchors.
pub const DEFAULT_MENTION_CLASS: &str = "plugin-mentions-user";
/// Element holding the topic title on a rendered NodeBB page.
pub const DEFAULT_TITLE_SELECTOR: &str = r#"span[component="topic/title"]"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub converter: ConverterConfig,
    pub fetch: FetchSettings,
    pub selectors: ContextSelectors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub mention_class: String,
    /// Tried in order; the first pattern that matches a blockquote is stripped once.
    pub citation_patterns: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mention_class: DEFAULT_MENTION_CLASS.to_string(),
            citation_patterns: vec![
                HEBREW_CITATION_PATTERN.to_string(),
                ENGLISH_CITATION_PATTERN.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl FetchSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            user_agent: concat!("thread_exporter/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSelectors {
    pub title_selector: String,
}

impl Default for ContextSelectors {
    fn default() -> Self {
        Self {
            title_selector: DEFAULT_TITLE_SELECTOR.to_string(),
        }
    }
}
