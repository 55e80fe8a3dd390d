//! Citations and URL-keyed deduplication

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::generate_id;

fn default_trusted() -> bool {
    true
}

/// A titled link offered as evidence for a slot assignment
///
/// Two citations are the same source when their URLs match; the id is only a handle
/// for the store and for the user's distrust list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default = "default_trusted")]
    pub trusted: bool,
}

impl Citation {
    /// Create a trusted citation with a generated id
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: generate_id("cite", &title),
            title,
            url: url.into(),
            trusted: true,
        }
    }

    /// Create a trusted citation with a caller-supplied id
    pub fn with_id(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            trusted: true,
        }
    }
}

/// Ordered citation list that never holds two entries with the same URL
///
/// The first citation seen for a URL wins; later duplicates are dropped.
#[derive(Debug, Clone, Default)]
pub struct CitationPool {
    citations: Vec<Citation>,
    seen: HashSet<String>,
}

impl CitationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a citation, returning false when its URL is already present
    pub fn insert(&mut self, citation: Citation) -> bool {
        if self.seen.contains(&citation.url) {
            debug!(url = %citation.url, "CitationPool::insert: duplicate url, skipping");
            return false;
        }
        self.seen.insert(citation.url.clone());
        self.citations.push(citation);
        true
    }

    /// Add every citation in order, returning how many were new
    pub fn extend<I: IntoIterator<Item = Citation>>(&mut self, citations: I) -> usize {
        let mut added = 0;
        for citation in citations {
            if self.insert(citation) {
                added += 1;
            }
        }
        added
    }

    pub fn into_vec(self) -> Vec<Citation> {
        self.citations
    }
}

/// Merge citation lists into one, keeping the first entry for each URL
pub fn dedup_by_url<I: IntoIterator<Item = Citation>>(citations: I) -> Vec<Citation> {
    let mut pool = CitationPool::new();
    pool.extend(citations);
    pool.into_vec()
}
