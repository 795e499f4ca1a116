use thiserror::Error;

/// Which configured element a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    Video,
    Container,
}

impl std::fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Container => write!(f, "container"),
        }
    }
}

/// Everything the controller can fail with. Nothing here is ever thrown
/// across the public boundary; each variant is logged and converted into a
/// state transition.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("{role} element `{id}` not found")]
    SurfaceNotFound { id: String, role: SurfaceRole },

    #[error("engine module failed to load: {reason}")]
    EngineLoadFailure { reason: String },

    #[error("engine is not supported in this environment")]
    EngineUnsupported,

    #[error("engine attach rejected: {reason}")]
    AttachRejected { reason: String },

    #[error("play request rejected: {reason}")]
    PlayRejected { reason: String },

    #[error("engine destroy failed: {reason}")]
    EngineDestroy { reason: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl SessionError {
    pub fn surface_not_found(id: impl Into<String>, role: SurfaceRole) -> Self {
        Self::SurfaceNotFound {
            id: id.into(),
            role,
        }
    }

    pub fn engine_load_failure(reason: impl Into<String>) -> Self {
        Self::EngineLoadFailure {
            reason: reason.into(),
        }
    }

    pub fn attach_rejected(reason: impl Into<String>) -> Self {
        Self::AttachRejected {
            reason: reason.into(),
        }
    }

    pub fn play_rejected(reason: impl Into<String>) -> Self {
        Self::PlayRejected {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Errors that switch the surface to direct source assignment instead of
    /// abandoning playback outright.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            Self::EngineLoadFailure { .. } | Self::EngineUnsupported | Self::AttachRejected { .. }
        )
    }
}

/// Discriminant for engine-reported faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Network,
    Media,
    Other,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Media => write!(f, "media"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A fault raised by a live engine instance, consumed once by the classifier.
#[derive(Debug, Clone)]
pub struct Fault {
    pub kind: FaultKind,
    /// Whether the engine deems this unrecoverable without a full re-attach.
    pub fatal: bool,
    pub detail: String,
}

impl Fault {
    pub fn network(fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Network,
            fatal,
            detail: detail.into(),
        }
    }

    pub fn media(fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Media,
            fatal,
            detail: detail.into(),
        }
    }

    pub fn other(fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Other,
            fatal,
            detail: detail.into(),
        }
    }

    /// Recoverable by restarting the load pipeline, without a re-attach.
    pub fn is_transient_network(&self) -> bool {
        self.kind == FaultKind::Network && !self.fatal
    }
}
