//! # player-session
//!
//! Streaming playback session controller. Loads an adaptive-bitrate streaming
//! engine on demand, attaches it to a video surface, classifies and retries
//! playback faults with bounded linear backoff, and falls back to direct
//! (native) source assignment when the engine is unsupported or unavailable.
//!
//! The controller owns exactly one active session at a time for one logical
//! playback surface. Host integration happens through three seams:
//!
//! - [`ElementRegistry`]: resolves the video surface and its container by id
//! - [`EngineProvider`]: performs the one-time engine module fetch
//! - [`CapabilityProbe`]: decides whether autoplay requires a muted surface
//!
//! Nothing fallible crosses the [`PlayerController`] boundary: every failure
//! is classified, logged, and used to drive the next state transition.

pub mod capability;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod loader;
pub mod session;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_utils;

pub use capability::{CapabilityProbe, UserAgentProbe};
pub use classifier::{DestroyReason, Disposition, RetryPolicy, SessionPhase};
pub use config::{DEFAULT_SOURCE_URL, SessionConfig, SessionOverrides};
pub use engine::{EngineInstance, EngineModule, EngineProvider, EngineSettings};
pub use error::{Fault, FaultKind, SessionError, SurfaceRole};
pub use loader::EngineLoader;
pub use session::PlayerController;
pub use surface::{Container, ElementRegistry, VideoSurface};
