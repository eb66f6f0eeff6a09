use sha2::{Digest, Sha256};

const MAX_STEM_CHARS: usize = 80;

/// Windows-safe, deterministic file name for an exported thread:
/// `{sanitized_title}--{short_hash(url)}.json`.
pub fn export_filename(title: &str, url: &str) -> String {
    let stem = sanitize_title(title);
    let hash = short_hash(url);
    format!("{stem}--{hash}.json")
}

fn sanitize_title(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    // Titles are often non-Latin, so cut on characters rather than bytes.
    let mut stem: String = compacted
        .trim_matches(&['_', ' ', '.'][..])
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    stem = stem.trim_end_matches(&['_', ' ', '.'][..]).to_string();
    if stem.is_empty() {
        stem = "thread".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}
