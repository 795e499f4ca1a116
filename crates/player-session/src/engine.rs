//! Abstraction over the external adaptive-streaming engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Fault, SessionError};
use crate::surface::VideoSurface;

/// Settings forwarded into a newly created engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Timeout applied to each network request the engine issues.
    pub request_timeout: Duration,
}

/// One-time fetch and initialization of the engine module. The loader
/// guarantees this runs at most once in flight; the "already inserted"
/// marker lives in [`crate::loader::EngineLoader`], not here.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    async fn fetch(&self) -> Result<Arc<dyn EngineModule>, SessionError>;
}

/// Handle to the loaded engine module, shared by all sessions.
pub trait EngineModule: Send + Sync {
    /// Whether the current environment can run engine-mediated playback.
    fn is_supported(&self) -> bool;

    fn create_instance(
        &self,
        settings: &EngineSettings,
    ) -> Result<Box<dyn EngineInstance>, SessionError>;
}

/// A live engine instance, exclusively owned by one session's fault
/// supervisor. At most one instance is ever attached to a given surface.
#[async_trait]
pub trait EngineInstance: Send {
    /// Bind the surface and begin manifest negotiation for `source`.
    async fn attach(
        &mut self,
        surface: &dyn VideoSurface,
        source: &str,
    ) -> Result<(), SessionError>;

    /// Restart the load pipeline after a transient fault. Not a re-attach.
    async fn start_load(&mut self) -> Result<(), SessionError>;

    /// Hand over the fault event stream. Yields the receiver exactly once.
    fn take_fault_stream(&mut self) -> Option<mpsc::Receiver<Fault>>;

    /// Release decoder and network resources.
    async fn destroy(&mut self) -> Result<(), SessionError>;
}
