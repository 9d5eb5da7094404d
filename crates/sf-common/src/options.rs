//! Caller-supplied options for one conversion.

use serde::{Deserialize, Serialize};

/// Layout and packaging options for one conversion.
///
/// Immutable once built. There is no default: callers must supply the
/// mastery score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Horizontal padding in pixels.
    pub margin_x: u32,
    /// Vertical padding in pixels.
    pub margin_y: u32,
    /// Score (0-100) a learner needs to pass.
    pub mastery_score: f64,
    /// Maximum content width; only effective with `restrict_width_and_center`.
    pub max_width: u32,
    pub restrict_width_and_center: bool,
    /// Show the attribution/license frame in the rendered bundle.
    pub show_rights: bool,
}

impl ConversionOptions {
    /// Create options with the required mastery score and no layout tweaks.
    pub fn new(mastery_score: f64) -> Self {
        Self {
            margin_x: 0,
            margin_y: 0,
            mastery_score,
            max_width: 0,
            restrict_width_and_center: false,
            show_rights: false,
        }
    }

    pub fn with_margins(mut self, margin_x: u32, margin_y: u32) -> Self {
        self.margin_x = margin_x;
        self.margin_y = margin_y;
        self
    }

    /// Restrict the content to `max_width` pixels and center it.
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self.restrict_width_and_center = true;
        self
    }

    pub fn with_show_rights(mut self, show_rights: bool) -> Self {
        self.show_rights = show_rights;
        self
    }

    /// The width limit the renderer should apply, if any.
    pub fn effective_max_width(&self) -> Option<u32> {
        self.restrict_width_and_center.then_some(self.max_width)
    }
}
