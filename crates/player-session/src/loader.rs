//! Engine Loader: fetches and initializes the external streaming engine
//! module at most once per controller, joining concurrent callers onto the
//! in-flight attempt.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::{EngineModule, EngineProvider};
use crate::error::SessionError;

type LoadResult = Result<Arc<dyn EngineModule>, SessionError>;

/// Load state cell. Transitions move forward only; the sole way out of
/// `Failed` is a later explicit [`EngineLoader::ensure_loaded`] call, which
/// starts a fresh attempt. The cell itself is the single-insertion marker:
/// while it reads `Loading`, no second fetch is started.
enum LoadState {
    Unloaded,
    Loading(watch::Receiver<Option<LoadResult>>),
    Loaded(Arc<dyn EngineModule>),
    Failed(SessionError),
}

enum Pending {
    /// This caller performs the fetch and publishes the result.
    Lead(watch::Sender<Option<LoadResult>>),
    /// Another fetch is in flight; wait for its result.
    Join(watch::Receiver<Option<LoadResult>>),
}

pub struct EngineLoader {
    provider: Arc<dyn EngineProvider>,
    state: Mutex<LoadState>,
}

impl EngineLoader {
    pub fn new(provider: Arc<dyn EngineProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(LoadState::Unloaded),
        }
    }

    /// Resolve the engine module, fetching it if necessary.
    ///
    /// - already loaded: resolves immediately with the cached handle
    /// - load in flight: joins the existing attempt (no duplicate fetch)
    /// - previous failure: all waiters of that attempt saw the same error;
    ///   this call starts a fresh attempt
    pub async fn ensure_loaded(&self) -> LoadResult {
        let pending = {
            let mut state = self.state.lock();
            match &*state {
                LoadState::Loaded(module) => return Ok(Arc::clone(module)),
                LoadState::Loading(rx) => Pending::Join(rx.clone()),
                LoadState::Unloaded => Self::begin(&mut state),
                LoadState::Failed(prev) => {
                    debug!(error = %prev, "retrying engine load after earlier failure");
                    Self::begin(&mut state)
                }
            }
        };

        match pending {
            Pending::Lead(tx) => {
                info!("loading streaming engine module");
                let result = self.provider.fetch().await;
                {
                    let mut state = self.state.lock();
                    *state = match &result {
                        Ok(module) => LoadState::Loaded(Arc::clone(module)),
                        Err(e) => LoadState::Failed(e.clone()),
                    };
                }
                match &result {
                    Ok(_) => info!("streaming engine module loaded"),
                    Err(e) => warn!(error = %e, "streaming engine module failed to load"),
                }
                let _ = tx.send(Some(result.clone()));
                result
            }
            Pending::Join(mut rx) => match rx.wait_for(Option::is_some).await {
                Ok(result) => match result.as_ref() {
                    Some(r) => r.clone(),
                    None => Err(SessionError::internal("engine load signal missing")),
                },
                Err(_) => Err(SessionError::internal("engine load attempt dropped")),
            },
        }
    }

    fn begin(state: &mut LoadState) -> Pending {
        let (tx, rx) = watch::channel(None);
        *state = LoadState::Loading(rx);
        Pending::Lead(tx)
    }
}
