//! Session Manager: owns the single active playback session and the public
//! `init` / `open` / `close` surface. Failures are logged and classified,
//! never propagated to the caller.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capability::CapabilityProbe;
use crate::classifier::{Disposition, RetryPolicy, SessionPhase, classify};
use crate::config::{SessionConfig, SessionOverrides};
use crate::engine::{EngineInstance, EngineModule, EngineProvider};
use crate::error::{Fault, SessionError, SurfaceRole};
use crate::fallback::attach_native;
use crate::loader::EngineLoader;
use crate::surface::{Container, ElementRegistry, VideoSurface};

/// The single active playback session. Engine-backed sessions carry a fault
/// supervisor task which exclusively owns the engine instance; fallback
/// sessions carry neither.
struct PlaybackSession {
    generation: u64,
    cancel: CancellationToken,
    supervisor: Option<JoinHandle<()>>,
    phase: Option<watch::Receiver<SessionPhase>>,
    surface: Arc<dyn VideoSurface>,
    container: Arc<dyn Container>,
}

/// Playback session controller for one logical surface.
///
/// All state is owned by the controller instance (the engine-module cache
/// included), so independent controllers never share hidden state.
pub struct PlayerController {
    config: SessionConfig,
    registry: Arc<dyn ElementRegistry>,
    loader: EngineLoader,
    probe: Arc<dyn CapabilityProbe>,
    session: Option<PlaybackSession>,
    /// Monotonic attach-attempt tag carried through supervisor logs. `open`
    /// takes `&mut self`, so attempts are serialized by the borrow itself.
    generation: u64,
    initialized: bool,
}

impl PlayerController {
    pub fn new(
        registry: Arc<dyn ElementRegistry>,
        provider: Arc<dyn EngineProvider>,
        probe: Arc<dyn CapabilityProbe>,
    ) -> Self {
        Self {
            config: SessionConfig::default(),
            registry,
            loader: EngineLoader::new(provider),
            probe,
            session: None,
            generation: 0,
            initialized: false,
        }
    }

    /// Merge caller overrides into the runtime configuration. Takes effect at
    /// the next `open`; an active session keeps its snapshot.
    pub fn init(&mut self, overrides: SessionOverrides) {
        if self.initialized {
            info!("already initialized, merging config");
        }
        self.config = self.config.merged(overrides);
        match self.registry.video(&self.config.surface_id) {
            Some(surface) => self.apply_autoplay_attributes(surface.as_ref()),
            None => warn!(
                surface_id = %self.config.surface_id,
                "video surface not present at init, attributes applied on open"
            ),
        }
        self.initialized = true;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Phase stream of the active engine-backed session, if any.
    pub fn session_phase(&self) -> Option<watch::Receiver<SessionPhase>> {
        self.session.as_ref().and_then(|s| s.phase.clone())
    }

    /// Open a playback session. Re-entrant: an active session is torn down
    /// first, so the last caller wins and engines never overlap. The container
    /// is revealed on entry regardless of attach outcome; playback arrives
    /// asynchronously.
    pub async fn open(&mut self) {
        self.teardown_active().await;

        self.generation += 1;
        let generation = self.generation;
        let config = self.config.clone();

        let surface = match self.registry.video(&config.surface_id) {
            Some(surface) => surface,
            None => {
                let e = SessionError::surface_not_found(&config.surface_id, SurfaceRole::Video);
                error!(error = %e, "open aborted");
                return;
            }
        };
        let container = match self.registry.container(&config.container_id) {
            Some(container) => container,
            None => {
                let e =
                    SessionError::surface_not_found(&config.container_id, SurfaceRole::Container);
                error!(error = %e, "open aborted");
                return;
            }
        };

        self.apply_autoplay_attributes(surface.as_ref());
        container.reveal();

        let mut session = PlaybackSession {
            generation,
            cancel: CancellationToken::new(),
            supervisor: None,
            phase: None,
            surface: Arc::clone(&surface),
            container: Arc::clone(&container),
        };

        match self.loader.ensure_loaded().await {
            Err(e) => {
                warn!(error = %e, "engine unavailable, falling back to native playback");
                attach_native(surface.as_ref(), &config.source_url).await;
            }
            Ok(module) if !module.is_supported() => {
                info!("engine unsupported in this environment, using native playback");
                attach_native(surface.as_ref(), &config.source_url).await;
            }
            Ok(module) => {
                match self.attach_with_engine(&module, &session, &config).await {
                    Ok((supervisor, phase)) => {
                        session.supervisor = Some(supervisor);
                        session.phase = Some(phase);
                    }
                    Err(e) if e.triggers_fallback() => {
                        warn!(error = %e, "engine attach failed, falling back to native playback");
                        attach_native(surface.as_ref(), &config.source_url).await;
                    }
                    Err(e) => {
                        error!(error = %e, "engine attach failed");
                    }
                }
            }
        }

        self.session = Some(session);
    }

    /// Close the active session: destroy the engine, pause and clear the
    /// surface, hide the container. Idempotent; calling it with nothing open
    /// is a no-op beyond the hide.
    pub async fn close(&mut self) {
        let torn_down = self.teardown_active().await;

        // Prefer the session's own elements; with nothing open, fall back to
        // a registry lookup so a never-opened close still hides the container.
        let (surface, container) = match &torn_down {
            Some(session) => (
                Some(Arc::clone(&session.surface)),
                Some(Arc::clone(&session.container)),
            ),
            None => (
                self.registry.video(&self.config.surface_id),
                self.registry.container(&self.config.container_id),
            ),
        };

        if let Some(surface) = surface {
            surface.pause();
            surface.clear_source();
            surface.reload();
        } else {
            warn!(surface_id = %self.config.surface_id, "close: video surface not found");
        }
        match container {
            Some(container) => container.hide(),
            None => warn!(container_id = %self.config.container_id, "close: container not found"),
        }
    }

    /// Cancel the supervisor and wait until the engine instance is destroyed.
    /// Strict destroy-before-attach hinges on awaiting the handle here.
    async fn teardown_active(&mut self) -> Option<PlaybackSession> {
        let PlaybackSession {
            generation,
            cancel,
            supervisor,
            phase,
            surface,
            container,
        } = self.session.take()?;

        cancel.cancel();
        if let Some(supervisor) = supervisor {
            if let Err(e) = supervisor.await {
                warn!(error = %e, "fault supervisor did not shut down cleanly");
            }
        }
        debug!(generation, "session torn down");
        Some(PlaybackSession {
            generation,
            cancel,
            supervisor: None,
            phase,
            surface,
            container,
        })
    }

    fn apply_autoplay_attributes(&self, surface: &dyn VideoSurface) {
        surface.set_inline_playback();
        surface.set_anonymous_cross_origin();
        if self.config.autoplay_muted && self.probe.requires_muted_autoplay() {
            debug!("restricted autoplay environment detected, muting surface");
            surface.set_muted(true);
        }
    }

    /// Create an engine instance, attach it, and hand it off to a spawned
    /// fault supervisor. The instance never escapes the supervisor once
    /// spawned; a play rejection after attach is logged, not an error.
    /// An instance that never reaches the supervisor is destroyed here —
    /// `destroy` is the release point, dropping the box is not enough.
    async fn attach_with_engine(
        &self,
        module: &Arc<dyn EngineModule>,
        session: &PlaybackSession,
        config: &SessionConfig,
    ) -> Result<(JoinHandle<()>, watch::Receiver<SessionPhase>), SessionError> {
        let mut engine = module.create_instance(&config.engine_settings())?;
        if let Err(e) = engine
            .attach(session.surface.as_ref(), &config.source_url)
            .await
        {
            destroy_engine(engine.as_mut(), session.generation).await;
            return Err(e);
        }
        let faults = match engine.take_fault_stream() {
            Some(faults) => faults,
            None => {
                destroy_engine(engine.as_mut(), session.generation).await;
                return Err(SessionError::internal("engine yielded no fault stream"));
            }
        };

        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Attached);
        let supervisor = tokio::spawn(supervise(
            engine,
            faults,
            config.retry_policy(),
            session.cancel.clone(),
            phase_tx,
            session.generation,
        ));
        info!(generation = session.generation, source = %config.source_url, "engine attached");

        if let Err(e) = session.surface.play().await {
            warn!(error = %e, "play rejected, awaiting user gesture");
        }
        Ok((supervisor, phase_rx))
    }
}

impl Drop for PlayerController {
    /// Drop cannot await the supervisor, but cancelling the session token
    /// wakes it off the fault stream and it destroys the engine on its own.
    /// `close` remains the orderly teardown path.
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

/// Fault supervisor for one attach attempt. Exclusively owns the engine
/// instance: consumes its fault stream, retries transient network faults with
/// linear backoff, and destroys the instance on cancellation, fatal fault,
/// exhaustion, or stream end. The retry counter is monotone per attach.
async fn supervise(
    mut engine: Box<dyn EngineInstance>,
    mut faults: mpsc::Receiver<Fault>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    phase: watch::Sender<SessionPhase>,
    generation: u64,
) {
    let mut retry_count: u32 = 0;
    loop {
        let fault = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(generation, "session cancelled, destroying engine");
                break;
            }
            fault = faults.recv() => match fault {
                Some(fault) => fault,
                None => {
                    debug!(generation, "fault stream ended, destroying engine");
                    break;
                }
            },
        };

        match classify(&fault, retry_count, &policy) {
            Disposition::Ignore => {
                debug!(
                    generation,
                    kind = %fault.kind,
                    detail = %fault.detail,
                    "non-fatal fault ignored"
                );
            }
            Disposition::Retry { attempt, delay } => {
                retry_count = attempt;
                warn!(
                    generation,
                    attempt,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    detail = %fault.detail,
                    "transient network fault, retrying load"
                );
                let _ = phase.send(SessionPhase::Retrying);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                if let Err(e) = engine.start_load().await {
                    warn!(generation, error = %e, "load restart failed");
                }
                let _ = phase.send(SessionPhase::Attached);
            }
            Disposition::Destroy { reason } => {
                error!(
                    generation,
                    %reason,
                    kind = %fault.kind,
                    fatal = fault.fatal,
                    detail = %fault.detail,
                    "unrecoverable fault, destroying engine"
                );
                break;
            }
        }
    }

    destroy_engine(engine.as_mut(), generation).await;
    let _ = phase.send(SessionPhase::Destroyed);
}

/// Release the instance's resources. Destroy failures are logged, never
/// propagated.
async fn destroy_engine(engine: &mut dyn EngineInstance, generation: u64) {
    if let Err(e) = engine.destroy().await {
        warn!(generation, error = %e, "engine destroy failed");
    }
}
