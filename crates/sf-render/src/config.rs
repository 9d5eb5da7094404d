//! Render configuration types.

use serde::{Deserialize, Serialize};

use sf_common::ConversionOptions;

/// Layout options and display flags for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Horizontal body padding in pixels.
    #[serde(default)]
    pub margin_x: u32,
    /// Vertical body padding in pixels.
    #[serde(default)]
    pub margin_y: u32,
    /// Center the content and cap its width.
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Show the action bar frame below the content.
    #[serde(default)]
    pub show_frame: bool,
    /// Show the rights/license button in the frame.
    #[serde(default)]
    pub show_license_button: bool,
    /// Minify the final document.
    #[serde(default)]
    pub minify: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin_x: 0,
            margin_y: 0,
            max_width: None,
            show_frame: false,
            show_license_button: false,
            minify: false,
        }
    }
}

impl RenderOptions {
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}

impl From<&ConversionOptions> for RenderOptions {
    fn from(options: &ConversionOptions) -> Self {
        Self {
            margin_x: options.margin_x,
            margin_y: options.margin_y,
            max_width: options.effective_max_width(),
            show_frame: options.show_rights,
            show_license_button: options.show_rights,
            minify: false,
        }
    }
}
