//! Record ID generation
//!
//! All IDs use the format: `{kind}-{slug}-{8-char-hex}`
//! Example: `task-morning-run-4f1c9a2e`

/// Maximum slug length kept in an ID
const MAX_SLUG_LEN: usize = 40;

/// Generate an ID from a record kind and a human title
pub fn generate_id(kind: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    // The tail of a v7 uuid is random; the head is a timestamp
    let suffix = &uuid[uuid.len() - 8..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", kind, suffix)
    } else {
        format!("{}-{}-{}", kind, slug, suffix)
    }
}

/// Slugify a title for use in IDs
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    slug.chars()
        .take(MAX_SLUG_LEN)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}
