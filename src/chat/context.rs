use std::sync::Arc;
use tracing::info;

use crate::types::VideoContext;

/// Holds the context of the video currently open. The context is only ever
/// replaced as a whole, readers get a shared snapshot.
#[derive(Debug, Clone, Default)]
pub struct VideoContextHolder {
    current: Option<Arc<VideoContext>>,
}

impl VideoContextHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the context of a newly submitted video
    pub fn replace(&mut self, context: VideoContext) -> Arc<VideoContext> {
        info!(
            "🎬 Video context replaced: \"{}\" ({} segments)",
            context.title,
            context.segments.len()
        );
        let context = Arc::new(context);
        self.current = Some(Arc::clone(&context));
        context
    }

    pub fn current(&self) -> Option<Arc<VideoContext>> {
        self.current.clone()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }
}
