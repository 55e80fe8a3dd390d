//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, warn};

use super::embedded;

/// Number of supporting sources requested from the ranking model
pub const RANK_SOURCE_COUNT: usize = 5;

/// Variables for the `rank` template
#[derive(Debug, Clone, Serialize)]
pub struct RankPromptContext {
    pub task: String,
    pub source_count: usize,
}

impl RankPromptContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            source_count: RANK_SOURCE_COUNT,
        }
    }
}

/// Variables for the `search-system` and `search-user` templates
#[derive(Debug, Clone, Serialize)]
pub struct SearchPromptContext {
    pub query: String,
    pub limit: usize,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (from `planner.prompts-dir`)
    override_dir: Option<PathBuf>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

impl PromptLoader {
    /// Create a loader that checks `dir` before the embedded prompts
    pub fn new(dir: Option<&Path>) -> Self {
        debug!(?dir, "PromptLoader::new: called");
        let override_dir = dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        if dir.is_some() && override_dir.is_none() {
            warn!(?dir, "Prompt override directory does not exist, using embedded prompts");
        }

        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load an override template by name, if one exists
    fn load_override(&self, name: &str) -> Option<String> {
        let dir = self.override_dir.as_ref()?;
        let path = dir.join(format!("{}.pmt", name));
        if !path.exists() {
            debug!(?path, "PromptLoader::load_override: not found");
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(?path, "PromptLoader::load_override: found");
                Some(content)
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to read prompt override, using embedded prompt");
                None
            }
        }
    }

    /// Render a template with the given context
    ///
    /// A broken override falls back to the embedded template.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String> {
        debug!(%name, "PromptLoader::render: called");
        if let Some(template) = self.load_override(name) {
            match self.hbs.render_template(&template, context) {
                Ok(rendered) => return Ok(rendered),
                Err(e) => warn!(%name, error = %e, "Failed to render prompt override, using embedded prompt"),
            }
        }

        let template = embedded::get_embedded(name).ok_or_else(|| eyre!("Prompt template not found: {}", name))?;
        self.hbs
            .render_template(template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}
