//! Error types for configuration, loading, rendering and playback.

use std::time::Duration;

use futures::task::SpawnError;
use thiserror::Error;

/// Invalid player configuration, detected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source list is empty
    #[error("No image sources given: at least one frame is required")]
    NoSources,

    /// A source entry is an empty string
    #[error("Image source at index {index} is empty")]
    EmptySource {
        /// Position of the offending entry
        index: usize,
    },

    /// The destination surface would have no pixels
    #[error("Invalid surface size: {width}x{height}")]
    ZeroSize {
        /// Logical width
        width: u32,
        /// Logical height
        height: u32,
    },

    /// Frames must be held for at least one tick
    #[error("Frame hold count must be at least 1")]
    ZeroHold,

    /// Device pixel ratio reported by the surface is unusable
    #[error("Invalid device pixel ratio: {0}")]
    InvalidPixelRatio(f64),

    /// TOML document could not be parsed
    #[cfg(feature = "toml")]
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// A single image source failed to load or decode.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Failed to load image '{source_url}': {reason}")]
pub struct LoadError {
    /// The source that failed
    pub source_url: String,
    /// Backend-specific description
    pub reason: String,
}

impl LoadError {
    /// Create a load error for `source`.
    pub fn new(source: &str, reason: impl Into<String>) -> Self {
        Self {
            source_url: source.to_owned(),
            reason: reason.into(),
        }
    }
}

/// The aggregate preload did not produce a complete image set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PreloadError {
    /// One of the sources failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Not every source completed before the deadline
    #[error("Preload timed out after {after:?}: {loaded} of {total} images loaded")]
    Timeout {
        /// Configured deadline
        after: Duration,
        /// Images that did complete
        loaded: usize,
        /// Images requested
        total: usize,
    },

    /// Loading reported completion but some positions were never filled
    #[error("Preload finished with {loaded} of {total} positions filled")]
    Incomplete {
        /// Filled positions
        loaded: usize,
        /// Images requested
        total: usize,
    },
}

/// Drawing onto the surface failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The frame index has no loaded image
    #[error("No image loaded for frame {index}")]
    MissingFrame {
        /// Requested frame
        index: usize,
    },

    /// The image has a zero dimension and cannot be scaled
    #[error("Image has zero size ({width}x{height})")]
    EmptyImage {
        /// Natural width
        width: u32,
        /// Natural height
        height: u32,
    },

    /// The drawing backend rejected an operation
    #[error("Surface backend error: {0}")]
    Backend(String),
}

/// Any error a [`FramePlayer`](crate::FramePlayer) can report.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Construction-time validation failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Images could not be preloaded
    #[error(transparent)]
    Preload(#[from] PreloadError),

    /// A frame could not be drawn
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The executor refused a task
    #[error("Failed to spawn player task: {0}")]
    Spawn(#[from] SpawnError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = LoadError::new("a.png", "404");
        assert_eq!(err.to_string(), "Failed to load image 'a.png': 404");

        let err = PreloadError::Timeout {
            after: Duration::from_secs(2),
            loaded: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "Preload timed out after 2s: 1 of 3 images loaded");

        let err: PlayerError = ConfigError::NoSources.into();
        assert!(err.to_string().contains("at least one frame"));
    }
}
