use export_logging::export_warn;
use htmd::element_handler::{HandlerResult, Handlers};
use htmd::Element;
use regex::Regex;
use url::Url;

use crate::ExportError;

/// A domain-specific override installed as an `htmd` element handler.
///
/// The rule is consulted for every element whose tag is in [`tags`](Self::tags),
/// at any depth. Returning `handlers.fallback(element)` hands the element back
/// to the stock conversion.
pub trait ConversionRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn tags(&self) -> &'static [&'static str];
    fn replacement(
        &self,
        handlers: &dyn Handlers,
        element: Element<'_>,
    ) -> Option<HandlerResult>;
}

/// Value of attribute `name` on `element`.
pub fn element_attr<'a>(element: &Element<'a>, name: &str) -> Option<&'a str> {
    element
        .attrs
        .iter()
        .find(|attribute| &*attribute.name.local == name)
        .map(|attribute| &*attribute.value)
}

/// Whether the `class` attribute of `element` lists `class`.
pub fn has_class(element: &Element<'_>, class: &str) -> bool {
    element_attr(element, "class")
        .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
}

/// Emits `![alt](src)` with relative sources made absolute against the forum root.
pub struct ImageRule {
    base: Option<Url>,
}

impl ImageRule {
    pub fn new(base: Option<&str>) -> Self {
        let base = base.and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(err) => {
                export_warn!("image base {raw:?} is not a valid URL: {err}");
                None
            }
        });
        Self { base }
    }

    fn absolute_src(&self, src: &str) -> String {
        match resolve_image_src(src, self.base.as_ref()) {
            Ok(resolved) => resolved,
            Err(err) => {
                export_warn!("could not create absolute URL for image {src:?}: {err}");
                src.to_string()
            }
        }
    }
}

impl ConversionRule for ImageRule {
    fn name(&self) -> &'static str {
        "absolute-images"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["img"]
    }

    fn replacement(
        &self,
        _handlers: &dyn Handlers,
        element: Element<'_>,
    ) -> Option<HandlerResult> {
        let src = element_attr(&element, "src").map(str::trim).unwrap_or_default();
        let alt = element_attr(&element, "alt").unwrap_or_default();
        Some(format!("![{alt}]({})", self.absolute_src(src)).into())
    }
}

#[derive(Debug, thiserror::Error)]
enum ImageUrlError {
    #[error("no base URL to resolve against")]
    MissingBase,
    #[error(transparent)]
    Join(#[from] url::ParseError),
}

fn resolve_image_src(src: &str, base: Option<&Url>) -> Result<String, ImageUrlError> {
    if src.is_empty() || has_scheme(src) {
        return Ok(src.to_string());
    }
    let base = base.ok_or(ImageUrlError::MissingBase)?;
    if src.starts_with("//") {
        return Ok(base.join(src)?.into());
    }

    // Root-relative sources live under the forum root, which may itself sit
    // below a sub-path (`https://host/community`).
    let mut root = base.clone();
    root.set_query(None);
    root.set_fragment(None);
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    Ok(root.join(src.trim_start_matches('/'))?.into())
}

/// `scheme ":"` per RFC 3986: a letter followed by letters, digits, `+`, `-` or `.`.
fn has_scheme(src: &str) -> bool {
    let Some((scheme, _)) = src.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Drops the "@user wrote in topic:" line NodeBB puts at the top of quoted
/// replies and re-emits the rest as a Markdown blockquote.
pub struct QuoteRule {
    citations: Vec<Regex>,
}

impl QuoteRule {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExportError> {
        let citations = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|err| ExportError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { citations })
    }

    fn strip_citation(&self, content: &str) -> String {
        self.citations
            .iter()
            .find(|citation| citation.is_match(content))
            .map(|citation| citation.replace(content, "").into_owned())
            .unwrap_or_else(|| content.to_string())
    }
}

impl ConversionRule for QuoteRule {
    fn name(&self) -> &'static str {
        "clean-blockquotes"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["blockquote"]
    }

    fn replacement(
        &self,
        handlers: &dyn Handlers,
        element: Element<'_>,
    ) -> Option<HandlerResult> {
        let content = handlers.walk_children(element.node).content;
        Some(quote_block(self.strip_citation(&content).trim()).into())
    }
}

/// Prefixes every line with `> ` and separates the block from its neighbours.
fn quote_block(text: &str) -> String {
    let quoted = text
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

/// Flattens mention widgets to their `@user` text.
pub struct MentionRule {
    marker_class: String,
}

impl MentionRule {
    pub fn new(marker_class: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
        }
    }
}

impl ConversionRule for MentionRule {
    fn name(&self) -> &'static str {
        "user-mentions"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["a"]
    }

    fn replacement(
        &self,
        handlers: &dyn Handlers,
        element: Element<'_>,
    ) -> Option<HandlerResult> {
        if !has_class(&element, &self.marker_class) {
            return handlers.fallback(element);
        }
        let text = handlers.walk_children(element.node).content;
        Some(text.split_whitespace().collect::<Vec<_>>().join(" ").into())
    }
}
