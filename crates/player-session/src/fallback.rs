//! Fallback Strategy: direct source assignment, bypassing the engine.

use tracing::{info, warn};

use crate::surface::VideoSurface;

/// Assign the source directly and try to play. Used when the engine fails to
/// load, reports the environment unsupported, or rejects the attach. A play
/// rejection leaves the surface paused-but-ready for a user gesture.
pub async fn attach_native(surface: &dyn VideoSurface, source: &str) {
    info!(source, "attaching source natively");
    surface.set_source(source);
    if let Err(e) = surface.play().await {
        warn!(error = %e, "native play rejected, leaving surface paused");
    }
}
