use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::RetryPolicy;
use crate::engine::EngineSettings;

/// Built-in well-known live stream, used when the caller supplies no source.
pub const DEFAULT_SOURCE_URL: &str =
    "https://static.france24.com/live/F24_FR_LO_HLS/live_web.m3u8";

pub const DEFAULT_SURFACE_ID: &str = "playerVideo";
pub const DEFAULT_CONTAINER_ID: &str = "playerModal";

/// Resolved runtime settings for the controller. Captured as an immutable
/// snapshot at `open`; mutated only through [`SessionConfig::merged`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Identifier of the video surface element.
    pub surface_id: String,
    /// Identifier of the containing element shown/hidden with the session.
    pub container_id: String,
    /// Source locator handed to the engine, or assigned directly on fallback.
    pub source_url: String,
    /// Allow muting the surface when the environment blocks unmuted autoplay.
    pub autoplay_muted: bool,
    /// Retry budget for transient network faults within one attach attempt.
    pub max_retries: u32,
    /// Timeout applied to each network request the engine issues, in ms.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    /// Base unit of the linear retry backoff (delay = attempt x base), in ms.
    #[serde(with = "duration_ms")]
    pub retry_base_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            surface_id: DEFAULT_SURFACE_ID.to_owned(),
            container_id: DEFAULT_CONTAINER_ID.to_owned(),
            source_url: DEFAULT_SOURCE_URL.to_owned(),
            autoplay_muted: true,
            max_retries: 3,
            request_timeout: Duration::from_millis(15_000),
            retry_base_delay: Duration::from_millis(1_000),
        }
    }
}

impl SessionConfig {
    /// Full-merge update: every unset override keeps the current value, so the
    /// result is always a complete snapshot, never a partial overwrite.
    pub fn merged(&self, overrides: SessionOverrides) -> Self {
        Self {
            surface_id: overrides.surface_id.unwrap_or_else(|| self.surface_id.clone()),
            container_id: overrides
                .container_id
                .unwrap_or_else(|| self.container_id.clone()),
            source_url: overrides.source_url.unwrap_or_else(|| self.source_url.clone()),
            autoplay_muted: overrides.autoplay_muted.unwrap_or(self.autoplay_muted),
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            request_timeout: overrides.request_timeout.unwrap_or(self.request_timeout),
            retry_base_delay: overrides.retry_base_delay.unwrap_or(self.retry_base_delay),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            request_timeout: self.request_timeout,
        }
    }
}

/// Caller-supplied configuration, merged over the current settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOverrides {
    pub surface_id: Option<String>,
    pub container_id: Option<String>,
    pub source_url: Option<String>,
    pub autoplay_muted: Option<bool>,
    pub max_retries: Option<u32>,
    #[serde(with = "opt_duration_ms")]
    pub request_timeout: Option<Duration>,
    #[serde(with = "opt_duration_ms")]
    pub retry_base_delay: Option<Duration>,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
