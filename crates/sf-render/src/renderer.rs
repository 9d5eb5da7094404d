//! The renderer capability.

use std::collections::BTreeSet;

use sf_common::{ActorId, ContentId};

use crate::config::RenderOptions;
use crate::error::Result;

/// A rendered, self-contained document and the content files it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBundle {
    pub html: String,
    /// Paths relative to the content root. A set: no duplicates, no order.
    pub resource_files: BTreeSet<String>,
}

impl RenderedBundle {
    pub fn new(html: impl Into<String>, resource_files: impl IntoIterator<Item = String>) -> Self {
        Self {
            html: html.into(),
            resource_files: resource_files.into_iter().collect(),
        }
    }
}

/// Renders saved content into a standalone bundle.
///
/// Implementations only read from storage.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        content_id: &ContentId,
        options: &RenderOptions,
        actor: &ActorId,
    ) -> Result<RenderedBundle>;
}
