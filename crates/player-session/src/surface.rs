//! Host-side seams: the video surface playback binds to, its containing
//! element, and lookup of both by configured identifier.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;

/// The video-rendering element playback is bound to.
///
/// Implementations wrap whatever the embedding shell renders with; the
/// controller only ever talks to this trait.
#[async_trait]
pub trait VideoSurface: Send + Sync {
    /// Hint inline (non-fullscreen) playback to the host.
    fn set_inline_playback(&self);

    /// Mark media requests as credential-less cross-origin fetches.
    fn set_anonymous_cross_origin(&self);

    fn set_muted(&self, muted: bool);

    /// Assign a source directly (native playback path).
    fn set_source(&self, source: &str);

    /// Clear the source and any child source descriptors.
    fn clear_source(&self);

    fn pause(&self);

    /// Force the surface to re-read its (now empty) source state.
    fn reload(&self);

    /// Begin playback. A rejection (autoplay policy or similar) maps to
    /// [`SessionError::PlayRejected`] and leaves the surface paused-but-ready.
    async fn play(&self) -> Result<(), SessionError>;
}

/// Containing element toggled in lockstep with session open/close.
/// Both operations are idempotent presentation toggles.
pub trait Container: Send + Sync {
    fn reveal(&self);
    fn hide(&self);
}

/// Element lookup by configured identifier.
pub trait ElementRegistry: Send + Sync {
    fn video(&self, id: &str) -> Option<Arc<dyn VideoSurface>>;
    fn container(&self, id: &str) -> Option<Arc<dyn Container>>;
}
