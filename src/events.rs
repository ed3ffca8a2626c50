//! Lifecycle hooks fired by the player.

use crate::PlayerError;

/// Receiver for player lifecycle events.
///
/// Every hook has a no-op default, so implementors only override what they
/// need. Hooks take `&self` and run on the player's thread; they may call
/// back into the player (for example `pause()` from `on_playing`).
pub trait PlayerEvents {
    /// All images are loaded. Fires once per player.
    fn on_ready(&self) {}

    /// The frame at `index` was just drawn.
    fn on_playing(&self, _index: usize) {}

    /// Playback was paused, or a deferred play request was dropped.
    fn on_paused(&self) {}

    /// Every frame was shown; the player has rewound to the first frame.
    fn on_ended(&self) {}

    /// One more image finished loading.
    fn on_load_progress(&self, _completed: usize, _total: usize) {}

    /// Loading or drawing failed.
    fn on_error(&self, _error: &PlayerError) {}
}

/// Ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEvents;

impl PlayerEvents for NoopEvents {}

/// Closure-based [`PlayerEvents`].
///
/// Unset hooks stay as no-op closures.
///
/// ## Example
///
/// ```rust
/// use frameseq_player::{EventHooks, PlayerEvents};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let drawn = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&drawn);
/// let hooks = EventHooks::new().with_playing(move |_| counter.set(counter.get() + 1));
///
/// hooks.on_playing(0);
/// hooks.on_ended();
/// assert_eq!(drawn.get(), 1);
/// ```
pub struct EventHooks {
    ready: Box<dyn Fn()>,
    playing: Box<dyn Fn(usize)>,
    paused: Box<dyn Fn()>,
    ended: Box<dyn Fn()>,
    progress: Box<dyn Fn(usize, usize)>,
    error: Box<dyn Fn(&PlayerError)>,
}

impl Default for EventHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHooks {
    /// Hooks that ignore every event.
    pub fn new() -> Self {
        Self {
            ready: Box::new(|| {}),
            playing: Box::new(|_| {}),
            paused: Box::new(|| {}),
            ended: Box::new(|| {}),
            progress: Box::new(|_, _| {}),
            error: Box::new(|_| {}),
        }
    }

    /// Call `f` once all images are loaded.
    pub fn with_ready(mut self, f: impl Fn() + 'static) -> Self {
        self.ready = Box::new(f);
        self
    }

    /// Call `f` with the index of each drawn frame.
    pub fn with_playing(mut self, f: impl Fn(usize) + 'static) -> Self {
        self.playing = Box::new(f);
        self
    }

    /// Call `f` when playback pauses.
    pub fn with_paused(mut self, f: impl Fn() + 'static) -> Self {
        self.paused = Box::new(f);
        self
    }

    /// Call `f` when the last frame has been shown.
    pub fn with_ended(mut self, f: impl Fn() + 'static) -> Self {
        self.ended = Box::new(f);
        self
    }

    /// Call `f` with `(completed, total)` as images load.
    pub fn with_load_progress(mut self, f: impl Fn(usize, usize) + 'static) -> Self {
        self.progress = Box::new(f);
        self
    }

    /// Call `f` when loading or drawing fails.
    pub fn with_error(mut self, f: impl Fn(&PlayerError) + 'static) -> Self {
        self.error = Box::new(f);
        self
    }
}

impl PlayerEvents for EventHooks {
    fn on_ready(&self) {
        (self.ready)()
    }

    fn on_playing(&self, index: usize) {
        (self.playing)(index)
    }

    fn on_paused(&self) {
        (self.paused)()
    }

    fn on_ended(&self) {
        (self.ended)()
    }

    fn on_load_progress(&self, completed: usize, total: usize) {
        (self.progress)(completed, total)
    }

    fn on_error(&self, error: &PlayerError) {
        (self.error)(error)
    }
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHooks").finish_non_exhaustive()
    }
}
