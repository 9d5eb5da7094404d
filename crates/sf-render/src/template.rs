//! SCORM page template.
//!
//! Wraps the rendered content in a page that loads the SCORM API wrapper and
//! the runtime adaptor, applies the configured margins, and optionally
//! centers the content under a maximum width.

use crate::config::RenderOptions;

/// SCORM 1.2 API discovery wrapper, shipped next to `index.html`.
pub const SCORM_WRAPPER_SCRIPT: &str = "SCORM_API_wrapper.js";

/// Runtime adaptor that reports xAPI results to the SCORM API.
pub const ADAPTOR_SCRIPT: &str = "h5p-adaptor.js";

/// Starts every uninitialized `.h5p-content` element. `H5P.init` skips
/// elements the core already started on its own.
const BOOTSTRAP: &str = "<script>if(window.H5P&&H5P.jQuery){H5P.jQuery(function(){H5P.init(document.body);});}</script>\n";

/// Everything the template places into the page.
#[derive(Debug, Clone, Default)]
pub struct PageParts {
    pub title: String,
    pub language: String,
    /// Inlined stylesheets, dependencies first.
    pub styles: Vec<String>,
    /// Inlined scripts, dependencies first.
    pub scripts: Vec<String>,
    /// Serialized integration object.
    pub integration_json: String,
    pub content_id: String,
    /// Start the H5P core once the page has loaded.
    pub bootstrap: bool,
}

/// Page layout derived from render options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScormTemplate {
    pub margin_x: u32,
    pub margin_y: u32,
    pub max_width: Option<u32>,
}

impl From<&RenderOptions> for ScormTemplate {
    fn from(options: &RenderOptions) -> Self {
        Self {
            margin_x: options.margin_x,
            margin_y: options.margin_y,
            max_width: options.max_width,
        }
    }
}

impl ScormTemplate {
    fn layout_css(&self) -> String {
        let mut css = format!(
            "html,body{{margin:0;}}body{{padding:{}px {}px;box-sizing:border-box;}}",
            self.margin_y, self.margin_x
        );
        if let Some(width) = self.max_width {
            css.push_str(&format!(
                ".h5p-scorm-container{{max-width:{width}px;margin:0 auto;}}"
            ));
        }
        css
    }

    /// Render the full page.
    pub fn render(&self, parts: &PageParts) -> String {
        let styles: String = parts
            .styles
            .iter()
            .map(|css| format!("<style>{}</style>\n", escape_inline(css, "style")))
            .collect();
        let scripts: String = parts
            .scripts
            .iter()
            .map(|js| format!("<script>{}</script>\n", escape_inline(js, "script")))
            .collect();
        let bootstrap = if parts.bootstrap { BOOTSTRAP } else { "" };

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="{wrapper}"></script>
<script src="{adaptor}"></script>
{styles}<style>{layout}</style>
</head>
<body>
<div class="h5p-scorm-container">
<div class="h5p-content" data-content-id="{content_id}"></div>
</div>
<script>window.H5PIntegration = {integration};</script>
{scripts}{bootstrap}</body>
</html>
"#,
            lang = html_escape(&parts.language),
            title = html_escape(&parts.title),
            wrapper = SCORM_WRAPPER_SCRIPT,
            adaptor = ADAPTOR_SCRIPT,
            styles = styles,
            layout = self.layout_css(),
            content_id = html_escape(&parts.content_id),
            integration = escape_inline(&parts.integration_json, "script"),
            scripts = scripts,
            bootstrap = bootstrap,
        )
    }
}

/// Keep inlined text from closing its enclosing element early.
fn escape_inline(text: &str, tag: &str) -> String {
    text.replace(&format!("</{tag}"), &format!("<\\/{tag}"))
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
