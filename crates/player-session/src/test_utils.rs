//! Mock collaborators shared by the unit tests: surfaces, containers,
//! registry, engine module/instances, and a scriptable engine provider.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::capability::CapabilityProbe;
use crate::config::SessionOverrides;
use crate::engine::{EngineInstance, EngineModule, EngineProvider, EngineSettings};
use crate::error::{Fault, SessionError};
use crate::session::PlayerController;
use crate::surface::{Container, ElementRegistry, VideoSurface};

/// Opt-in log output while debugging tests: `RUST_LOG=debug cargo test`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll a condition until it holds; panics after one second.
pub async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..500 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not met within 1s");
}

pub fn default_overrides() -> SessionOverrides {
    SessionOverrides {
        surface_id: Some("video".into()),
        container_id: Some("modal".into()),
        source_url: Some("https://example.com/live.m3u8".into()),
        autoplay_muted: Some(true),
        max_retries: Some(3),
        request_timeout: Some(Duration::from_millis(100)),
        retry_base_delay: Some(Duration::from_millis(1)),
    }
}

// --- surfaces -------------------------------------------------------------

#[derive(Default)]
pub struct SurfaceState {
    pub source: Mutex<Option<String>>,
    pub muted: AtomicBool,
    pub inline: AtomicBool,
    pub anonymous_cross_origin: AtomicBool,
    pub paused: AtomicBool,
    pub play_calls: AtomicU32,
    pub reload_calls: AtomicU32,
}

impl SurfaceState {
    pub fn play_calls(&self) -> u32 {
        self.play_calls.load(Ordering::SeqCst)
    }
}

pub struct MockSurface {
    pub state: Arc<SurfaceState>,
    reject_play: bool,
}

impl MockSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::default(),
            reject_play: false,
        })
    }

    pub fn rejecting_play() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::default(),
            reject_play: true,
        })
    }
}

#[async_trait]
impl VideoSurface for MockSurface {
    fn set_inline_playback(&self) {
        self.state.inline.store(true, Ordering::SeqCst);
    }

    fn set_anonymous_cross_origin(&self) {
        self.state
            .anonymous_cross_origin
            .store(true, Ordering::SeqCst);
    }

    fn set_muted(&self, muted: bool) {
        self.state.muted.store(muted, Ordering::SeqCst);
    }

    fn set_source(&self, source: &str) {
        *self.state.source.lock() = Some(source.to_owned());
    }

    fn clear_source(&self) {
        *self.state.source.lock() = None;
    }

    fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    fn reload(&self) {
        self.state.reload_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn play(&self) -> Result<(), SessionError> {
        self.state.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_play {
            return Err(SessionError::play_rejected("autoplay blocked"));
        }
        self.state.paused.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockContainer {
    pub visible: AtomicBool,
    pub reveals: AtomicU32,
    pub hides: AtomicU32,
}

impl MockContainer {
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl Container for MockContainer {
    fn reveal(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.reveals.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockRegistry {
    videos: Mutex<HashMap<String, Arc<MockSurface>>>,
    containers: Mutex<HashMap<String, Arc<MockContainer>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_video(&self, id: &str) -> Arc<MockSurface> {
        let surface = MockSurface::new();
        self.videos.lock().insert(id.to_owned(), surface.clone());
        surface
    }

    pub fn add_video_rejecting_play(&self, id: &str) -> Arc<MockSurface> {
        let surface = MockSurface::rejecting_play();
        self.videos.lock().insert(id.to_owned(), surface.clone());
        surface
    }

    pub fn add_container(&self, id: &str) -> Arc<MockContainer> {
        let container = Arc::new(MockContainer::default());
        self.containers
            .lock()
            .insert(id.to_owned(), container.clone());
        container
    }

    pub fn get_video(&self, id: &str) -> Option<Arc<MockSurface>> {
        self.videos.lock().get(id).cloned()
    }

    pub fn get_container(&self, id: &str) -> Option<Arc<MockContainer>> {
        self.containers.lock().get(id).cloned()
    }
}

impl ElementRegistry for MockRegistry {
    fn video(&self, id: &str) -> Option<Arc<dyn VideoSurface>> {
        self.get_video(id).map(|s| s as Arc<dyn VideoSurface>)
    }

    fn container(&self, id: &str) -> Option<Arc<dyn Container>> {
        self.get_container(id).map(|c| c as Arc<dyn Container>)
    }
}

// --- capability -----------------------------------------------------------

pub struct StaticProbe(pub bool);

impl CapabilityProbe for StaticProbe {
    fn requires_muted_autoplay(&self) -> bool {
        self.0
    }
}

// --- engine ---------------------------------------------------------------

/// Shared counters observed by the tests across module, instances, and drops.
#[derive(Default)]
pub struct EngineProbe {
    pub created: AtomicU32,
    pub destroyed: AtomicU32,
    pub alive: AtomicI32,
    pub max_alive: AtomicI32,
    pub attach_calls: AtomicU32,
    pub load_restarts: AtomicU32,
}

pub struct MockEngineModule {
    pub probe: Arc<EngineProbe>,
    pub supported: AtomicBool,
    pub fail_attach: AtomicBool,
    fault_txs: Mutex<Vec<mpsc::Sender<Fault>>>,
}

impl MockEngineModule {
    pub fn supported() -> Arc<Self> {
        Arc::new(Self {
            probe: Arc::new(EngineProbe::default()),
            supported: AtomicBool::new(true),
            fail_attach: AtomicBool::new(false),
            fault_txs: Mutex::new(Vec::new()),
        })
    }

    /// Fault injection handle for the most recently created instance.
    pub fn latest_fault_sender(&self) -> mpsc::Sender<Fault> {
        self.fault_txs
            .lock()
            .last()
            .cloned()
            .expect("no engine instance created yet")
    }
}

impl EngineModule for MockEngineModule {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn create_instance(
        &self,
        _settings: &EngineSettings,
    ) -> Result<Box<dyn EngineInstance>, SessionError> {
        let (tx, rx) = mpsc::channel(8);
        self.fault_txs.lock().push(tx);
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        let alive = self.probe.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_alive.fetch_max(alive, Ordering::SeqCst);
        Ok(Box::new(MockEngineInstance {
            probe: Arc::clone(&self.probe),
            faults: Some(rx),
            fail_attach: self.fail_attach.load(Ordering::SeqCst),
            destroyed: false,
        }))
    }
}

pub struct MockEngineInstance {
    probe: Arc<EngineProbe>,
    faults: Option<mpsc::Receiver<Fault>>,
    fail_attach: bool,
    destroyed: bool,
}

#[async_trait]
impl EngineInstance for MockEngineInstance {
    async fn attach(
        &mut self,
        _surface: &dyn VideoSurface,
        _source: &str,
    ) -> Result<(), SessionError> {
        self.probe.attach_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_attach {
            return Err(SessionError::attach_rejected("scripted attach rejection"));
        }
        Ok(())
    }

    async fn start_load(&mut self) -> Result<(), SessionError> {
        self.probe.load_restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn take_fault_stream(&mut self) -> Option<mpsc::Receiver<Fault>> {
        self.faults.take()
    }

    async fn destroy(&mut self) -> Result<(), SessionError> {
        if !self.destroyed {
            self.destroyed = true;
            self.probe.destroyed.fetch_add(1, Ordering::SeqCst);
            self.probe.alive.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for MockEngineInstance {
    fn drop(&mut self) {
        // A dropped-but-not-destroyed instance still stops being alive.
        if !self.destroyed {
            self.destroyed = true;
            self.probe.alive.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// --- provider -------------------------------------------------------------

type FetchResult = Result<Arc<dyn EngineModule>, SessionError>;

enum ProviderScript {
    Always(FetchResult),
    Sequence(Mutex<VecDeque<FetchResult>>),
}

pub struct MockProvider {
    pub fetches: AtomicU32,
    delay: Duration,
    script: ProviderScript,
}

impl MockProvider {
    pub fn always_ok(module: Arc<dyn EngineModule>) -> Self {
        Self {
            fetches: AtomicU32::new(0),
            delay: Duration::ZERO,
            script: ProviderScript::Always(Ok(module)),
        }
    }

    pub fn sequence(results: Vec<FetchResult>) -> Self {
        Self {
            fetches: AtomicU32::new(0),
            delay: Duration::ZERO,
            script: ProviderScript::Sequence(Mutex::new(results.into())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl EngineProvider for MockProvider {
    async fn fetch(&self) -> FetchResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ProviderScript::Always(result) => result.clone(),
            ProviderScript::Sequence(queue) => queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SessionError::internal("provider script exhausted"))),
        }
    }
}

// --- harness --------------------------------------------------------------

/// Fully wired controller with mock collaborators.
pub struct Harness {
    pub controller: PlayerController,
    pub registry: Arc<MockRegistry>,
    pub surface: Arc<MockSurface>,
    pub container: Arc<MockContainer>,
    pub module: Arc<MockEngineModule>,
    pub probe: Arc<EngineProbe>,
}

impl Harness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_provider(provider: Arc<MockProvider>) -> Self {
        Self::builder().provider(provider).build()
    }

    pub fn with_registry(registry: Arc<MockRegistry>) -> Self {
        Self::builder().registry(registry).build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            registry: None,
            provider: None,
            capability: StaticProbe(false),
            module: MockEngineModule::supported(),
        }
    }
}

pub struct HarnessBuilder {
    registry: Option<Arc<MockRegistry>>,
    provider: Option<Arc<dyn EngineProvider>>,
    capability: StaticProbe,
    module: Arc<MockEngineModule>,
}

impl HarnessBuilder {
    pub fn registry(mut self, registry: Arc<MockRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn provider(mut self, provider: Arc<MockProvider>) -> Self {
        self.provider = Some(provider as Arc<dyn EngineProvider>);
        self
    }

    pub fn capability(mut self, capability: StaticProbe) -> Self {
        self.capability = capability;
        self
    }

    pub fn build(self) -> Harness {
        init_test_logging();
        let registry = self.registry.unwrap_or_else(|| {
            let registry = Arc::new(MockRegistry::new());
            registry.add_video("video");
            registry.add_container("modal");
            registry
        });
        // Custom registries may deliberately omit elements; keep detached
        // stand-ins so the harness fields stay usable.
        let surface = registry.get_video("video").unwrap_or_else(MockSurface::new);
        let container = registry
            .get_container("modal")
            .unwrap_or_else(|| Arc::new(MockContainer::default()));

        let module = self.module;
        let probe = Arc::clone(&module.probe);
        let provider = self.provider.unwrap_or_else(|| {
            let as_module: Arc<dyn EngineModule> = module.clone();
            Arc::new(MockProvider::always_ok(as_module)) as Arc<dyn EngineProvider>
        });

        let as_registry: Arc<dyn ElementRegistry> = registry.clone();
        let as_probe: Arc<dyn CapabilityProbe> = Arc::new(self.capability);
        let mut controller = PlayerController::new(as_registry, provider, as_probe);
        controller.init(default_overrides());

        Harness {
            controller,
            registry,
            surface,
            container,
            module,
            probe,
        }
    }
}
