use export_logging::export_debug;

use crate::convert::Converter;
use crate::{NormalizedPost, RawPost};

/// Drops missing, deleted and malformed posts and converts the rest.
/// Input order is preserved.
pub fn normalize(raw_posts: &[Option<RawPost>], converter: &dyn Converter) -> Vec<NormalizedPost> {
    raw_posts
        .iter()
        .flatten()
        .filter(|post| !post.deleted)
        .filter_map(|post| normalize_post(post, converter))
        .collect()
}

fn normalize_post(post: &RawPost, converter: &dyn Converter) -> Option<NormalizedPost> {
    let Some(pid) = post.pid.clone() else {
        export_debug!("skipping post without pid");
        return None;
    };
    let Some(author) = post.user.as_ref().and_then(|user| user.username.clone()) else {
        export_debug!("skipping post {} without author", pid);
        return None;
    };
    let content = converter
        .to_markdown(post.content.as_deref().unwrap_or_default())
        .trim()
        .to_string();
    let reply_to_pid = post.to_pid.clone().filter(|id| !id.is_unset());

    Some(NormalizedPost {
        pid,
        author,
        content,
        reply_to_pid,
    })
}
