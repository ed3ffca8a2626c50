//! Playback settings: the serialisable half of a player's configuration.

use std::time::Duration;

use crate::ConfigError;

/// Default time between frame advances.
pub const DEFAULT_DELAY_MS: u64 = 250;

/// Default deadline for preloading the whole image set.
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Settings for one playback session.
///
/// `width`/`height` are logical sizes before pixel-density scaling; when
/// absent, the surface's own logical size is used.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackSettings {
    /// Logical surface width
    pub width: Option<u32>,
    /// Logical surface height
    pub height: Option<u32>,
    /// Image sources in playback order
    pub sources: Vec<String>,
    /// Minimum time between frame advances
    pub delay_ms: u64,
    /// Consecutive ticks each frame stays on screen
    pub hold_ticks: u32,
    /// Preload deadline; `None` or `0` waits forever
    pub load_timeout_ms: Option<u64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            sources: Vec::new(),
            delay_ms: DEFAULT_DELAY_MS,
            hold_ticks: 1,
            load_timeout_ms: Some(DEFAULT_LOAD_TIMEOUT_MS),
        }
    }
}

impl PlaybackSettings {
    /// Settings for the given sources with default timing.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse settings from a TOML document.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Set the logical surface size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the minimum time between frame advances.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Hold each frame for `hold_ticks` consecutive ticks.
    pub fn with_hold_ticks(mut self, hold_ticks: u32) -> Self {
        self.hold_ticks = hold_ticks;
        self
    }

    /// Set the preload deadline; `None` or `Some(0)` disables it.
    pub fn with_load_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.load_timeout_ms = timeout_ms;
        self
    }

    /// Delay between frame advances.
    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Preload deadline, if any.
    ///
    /// A zero timeout means no deadline, so TOML documents (which have no
    /// null) can disable it with `load_timeout_ms = 0`.
    #[inline]
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.filter(|&ms| ms > 0).map(Duration::from_millis)
    }

    /// Check the settings before any resource is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if let Some(index) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptySource { index });
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ConfigError::ZeroSize {
                width: self.width.unwrap_or_default(),
                height: self.height.unwrap_or_default(),
            });
        }
        if self.hold_ticks == 0 {
            return Err(ConfigError::ZeroHold);
        }
        Ok(())
    }
}
