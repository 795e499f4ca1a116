//! Capability detection for the autoplay-mute policy.

/// Environment probe deciding whether autoplay is only permitted muted.
/// Kept behind a trait so the heuristic is swappable without a real browser.
pub trait CapabilityProbe: Send + Sync {
    fn requires_muted_autoplay(&self) -> bool;
}

/// User-agent sniffing probe. Mutes only on Android Chrome, where unmuted
/// autoplay is routinely blocked.
#[derive(Debug, Clone)]
pub struct UserAgentProbe {
    user_agent: String,
}

impl UserAgentProbe {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl CapabilityProbe for UserAgentProbe {
    fn requires_muted_autoplay(&self) -> bool {
        let ua = self.user_agent.to_ascii_lowercase();
        ua.contains("android") && ua.contains("chrome")
    }
}
