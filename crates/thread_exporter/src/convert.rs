use std::fmt;
use std::sync::Arc;

use export_logging::{export_trace, export_warn};
use htmd::element_handler::Handlers;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use htmd::{Element, HtmlToMarkdown};

use crate::config::ConverterConfig;
use crate::rules::{ConversionRule, ImageRule, MentionRule, QuoteRule};
use crate::ExportError;

pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// HTML fragment to Markdown converter.
///
/// Generic markup goes through `htmd` (ATX headings, fenced code, `-`
/// bullets, escaped text). Each [`ConversionRule`] is installed as an `htmd`
/// handler for its tags, so it also applies to nested elements.
pub struct ForumMarkdownConverter {
    rules: Vec<Arc<dyn ConversionRule>>,
    inner: HtmlToMarkdown,
}

impl ForumMarkdownConverter {
    /// Converter with the forum rules (images, quoted replies, mentions).
    /// Relative image sources are resolved against `image_base`.
    pub fn new(config: &ConverterConfig, image_base: Option<&str>) -> Result<Self, ExportError> {
        let quotes = QuoteRule::new(&config.citation_patterns)?;
        Ok(Self::plain()
            .with_rule(Box::new(ImageRule::new(image_base)))
            .with_rule(Box::new(quotes))
            .with_rule(Box::new(MentionRule::new(config.mention_class.clone()))))
    }

    /// Converter with no rules installed, only the generic mapping.
    pub fn plain() -> Self {
        Self {
            rules: Vec::new(),
            inner: build_inner(&[]),
        }
    }

    /// Adds a rule. A later rule claiming the same tag is consulted first.
    pub fn with_rule(mut self, rule: Box<dyn ConversionRule>) -> Self {
        self.rules.push(Arc::from(rule));
        self.inner = build_inner(&self.rules);
        self
    }
}

fn markdown_options() -> Options {
    Options {
        heading_style: HeadingStyle::Atx,
        code_block_style: CodeBlockStyle::Fenced,
        bullet_list_marker: BulletListMarker::Dash,
        ..Options::default()
    }
}

fn build_inner(rules: &[Arc<dyn ConversionRule>]) -> HtmlToMarkdown {
    let mut builder = HtmlToMarkdown::builder()
        .options(markdown_options())
        .skip_tags(vec!["script", "style", "noscript", "template"]);
    for rule in rules {
        let handler = Arc::clone(rule);
        builder = builder.add_handler(
            rule.tags().to_vec(),
            move |handlers: &dyn Handlers, element: Element<'_>| {
                export_trace!("rule {} handles <{}>", handler.name(), element.tag);
                handler.replacement(handlers, element)
            },
        );
    }
    builder.build()
}

impl fmt::Debug for ForumMarkdownConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("ForumMarkdownConverter")
            .field("rules", &names)
            .finish()
    }
}

impl Converter for ForumMarkdownConverter {
    fn to_markdown(&self, html: &str) -> String {
        match self.inner.convert(html) {
            Ok(markdown) => markdown.trim().to_string(),
            Err(err) => {
                export_warn!("markdown conversion failed: {err}");
                String::new()
            }
        }
    }
}
