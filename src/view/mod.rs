//! View rendering
//!
//! Server-side HTML rendering using Tera. Templates are embedded into the
//! binary at compile time so the server ships as a single file with no
//! template directory to deploy.

use tera::{Context as TeraContext, Tera};
use thiserror::Error;

/// View errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Template rendering error
    #[error("Failed to render '{template}': {source}")]
    RenderError {
        template: String,
        #[source]
        source: tera::Error,
    },

    /// Template registration error at startup
    #[error("Failed to register templates: {0}")]
    RegisterError(#[from] tera::Error),
}

/// Templates compiled into the binary
const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("story.html", include_str!("../../templates/story.html")),
    ("list.html", include_str!("../../templates/list.html")),
    ("search.html", include_str!("../../templates/search.html")),
    ("upload_new.html", include_str!("../../templates/upload_new.html")),
    ("upload_edit.html", include_str!("../../templates/upload_edit.html")),
    ("genres.html", include_str!("../../templates/genres.html")),
    ("404.html", include_str!("../../templates/404.html")),
];

/// View engine wrapping a Tera instance with the embedded templates
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Build the engine and register all embedded templates.
    pub fn new() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    /// Render a template with the given context.
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ViewError> {
        self.tera
            .render(template, context)
            .map_err(|source| ViewError::RenderError {
                template: template.to_string(),
                source,
            })
    }

    /// Render the not-found page. Falls back to a plain message if even
    /// that template fails, so error paths always produce a body.
    pub fn render_not_found(&self) -> String {
        match self.render("404.html", &TeraContext::new()) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render 404 template: {}", e);
                "Không tìm thấy trang".to_string()
            }
        }
    }
}
