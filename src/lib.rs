//! # frameseq-player
//!
//! Frame-sequence animation player: renders an ordered list of still images
//! onto a drawing surface at a controlled rate, emulating video playback
//! without a video decoder.
//!
//! This crate provides platform-agnostic logic for:
//! - Preloading images in parallel while preserving their order
//! - Cover-fit (aspect-fill) geometry for a fixed-size surface
//! - Refresh-aligned, delay-throttled frame scheduling
//! - A play/pause/ended playback state machine with lifecycle hooks
//!
//! ## Features
//!
//! - `raster` (default) - In-memory RGBA surface and filesystem loader via the `image` crate
//! - `web` - HTML canvas surface, `<img>` loader and `requestAnimationFrame` clock
//! - `serde` - Enable serialization/deserialization for [`PlaybackSettings`]
//! - `toml` - Parse [`PlaybackSettings`] from TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use frameseq_player::{EventHooks, FramePlayer, PlaybackSettings, PlayerConfig};
//! use frameseq_player::{CanvasSurface, WebClock, WebImageLoader, WebSpawner};
//! use std::rc::Rc;
//!
//! let settings = PlaybackSettings::new(urls).with_size(375, 667).with_delay_ms(100);
//! let events = EventHooks::new()
//!     .with_ready(|| log::info!("ready"))
//!     .with_ended(|| log::info!("done"));
//!
//! let config = PlayerConfig::new(
//!     settings,
//!     CanvasSurface::new(canvas)?,
//!     WebImageLoader::new(),
//!     WebClock::new(),
//!     Rc::new(WebSpawner),
//! )
//! .with_events(Rc::new(events));
//!
//! let player = FramePlayer::new(config)?;
//! player.play();
//! ```

mod animation;
mod clock;
mod config;
mod error;
mod events;
pub mod geometry;
mod loader;
mod player;
pub mod render;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use animation::{PlayRequest, PlaybackPhase, PlaybackState, Tick};
pub use clock::FrameClock;
pub use config::{PlaybackSettings, DEFAULT_DELAY_MS, DEFAULT_LOAD_TIMEOUT_MS};
pub use error::{ConfigError, LoadError, PlayerError, PreloadError, RenderError};
pub use events::{EventHooks, NoopEvents, PlayerEvents};
pub use geometry::{cover_crop, CropAxis, Rect, SourceRect};
pub use loader::{load_images, preload, ImageLoader, LoadProgress, LoadedImageSet};
pub use player::{FramePlayer, PlayerConfig};
pub use render::{render_frame, FrameImage, RenderPlan, Surface};

#[cfg(not(target_arch = "wasm32"))]
pub use clock::ThreadClock;

#[cfg(feature = "raster")]
pub use loader::raster::FileLoader;
#[cfg(feature = "raster")]
pub use render::raster::RasterSurface;

#[cfg(feature = "web")]
pub use clock::web::WebClock;
#[cfg(feature = "web")]
pub use loader::web::WebImageLoader;
#[cfg(feature = "web")]
pub use render::web::CanvasSurface;
#[cfg(feature = "web")]
pub use scheduler::web::WebSpawner;
