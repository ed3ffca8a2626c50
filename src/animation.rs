//! Playback state machine for frame-sequence animation.

/// Observable playback phase, derived from [`PlaybackState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Resources not loaded yet
    Idle,
    /// Loaded and stopped at a clean start (initially, or after the sequence ended)
    Ready,
    /// Frames are being advanced
    Playing,
    /// Stopped by an explicit pause
    Paused,
}

/// What a play request should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayRequest {
    /// Already playing; nothing to do
    AlreadyPlaying,
    /// Resources are missing; playback starts once loading completes
    AwaitLoad,
    /// Playback started; the caller must start the tick chain
    Start,
}

/// Result of one scheduler tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Draw the frame at this index and keep ticking
    Render(usize),
    /// All frames consumed; state has been reset for replay
    Ended,
    /// Not playing; the tick chain should stop without drawing
    Halted,
}

/// Platform-agnostic playback bookkeeping.
///
/// This holds no timing or drawing logic. The scheduler calls [`tick`](Self::tick)
/// once per refresh opportunity and acts on the returned [`Tick`].
///
/// ## Example
///
/// ```rust
/// use frameseq_player::{PlaybackState, PlayRequest, Tick};
///
/// let mut state = PlaybackState::new(1);
/// assert_eq!(state.request_play(), PlayRequest::AwaitLoad);
///
/// state.mark_loaded(2);
/// assert!(state.take_pending_play());
/// assert_eq!(state.request_play(), PlayRequest::Start);
///
/// assert_eq!(state.tick(), Tick::Render(0));
/// assert_eq!(state.tick(), Tick::Render(1));
/// assert_eq!(state.tick(), Tick::Ended);
/// assert_eq!(state.frame_index(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct PlaybackState {
    /// Frames are advancing
    playing: bool,
    /// Set once every image is decoded; never reverts
    resources_loaded: bool,
    /// A play request arrived before resources were loaded
    play_pending: bool,
    /// Stopped by pause rather than by ending
    paused: bool,
    /// Next frame to draw, in `0..=frame_count`
    frame_index: usize,
    /// Ticks spent on the current frame, in `0..repeat_max`
    repeat_count: u32,
    /// Ticks each frame is held for
    repeat_max: u32,
    /// Number of loaded frames
    frame_count: usize,
}

impl PlaybackState {
    /// Create a state that holds each frame for `repeat_max` ticks.
    pub fn new(repeat_max: u32) -> Self {
        Self {
            playing: false,
            resources_loaded: false,
            play_pending: false,
            paused: false,
            frame_index: 0,
            repeat_count: 0,
            repeat_max: repeat_max.max(1),
            frame_count: 0,
        }
    }

    /// Record that `frame_count` frames are available.
    ///
    /// Returns `true` only on the first call.
    pub fn mark_loaded(&mut self, frame_count: usize) -> bool {
        if self.resources_loaded {
            return false;
        }
        self.resources_loaded = true;
        self.frame_count = frame_count;
        true
    }

    /// Handle a play request.
    pub fn request_play(&mut self) -> PlayRequest {
        if self.playing {
            return PlayRequest::AlreadyPlaying;
        }
        if !self.resources_loaded {
            self.play_pending = true;
            return PlayRequest::AwaitLoad;
        }
        self.playing = true;
        self.paused = false;
        self.play_pending = false;
        PlayRequest::Start
    }

    /// Consume a deferred play request.
    pub fn take_pending_play(&mut self) -> bool {
        std::mem::take(&mut self.play_pending)
    }

    /// Stop playback, or drop a deferred play request.
    ///
    /// Returns `false` when there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if self.playing {
            self.playing = false;
            self.paused = true;
            true
        } else if self.play_pending {
            self.play_pending = false;
            true
        } else {
            false
        }
    }

    /// Stop playback without counting it as a user pause.
    pub fn halt(&mut self) {
        self.playing = false;
        self.play_pending = false;
    }

    /// Advance one tick.
    ///
    /// The end-of-sequence check runs before the playing check, so a tick that
    /// observes every frame consumed always ends and rewinds.
    pub fn tick(&mut self) -> Tick {
        if self.frame_index == self.frame_count {
            self.playing = false;
            self.paused = false;
            self.frame_index = 0;
            self.repeat_count = 0;
            return Tick::Ended;
        }
        if !self.playing {
            return Tick::Halted;
        }

        let index = self.frame_index;
        self.repeat_count += 1;
        if self.repeat_count >= self.repeat_max {
            self.repeat_count = 0;
            self.frame_index += 1;
        }
        Tick::Render(index)
    }

    /// Current playback phase.
    pub fn phase(&self) -> PlaybackPhase {
        if self.playing {
            PlaybackPhase::Playing
        } else if !self.resources_loaded {
            PlaybackPhase::Idle
        } else if self.paused {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Ready
        }
    }

    /// Whether frames are currently advancing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether every image has been loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.resources_loaded
    }

    /// Whether a play request is waiting for loading to finish.
    #[inline]
    pub fn is_play_pending(&self) -> bool {
        self.play_pending
    }

    /// Index of the next frame to draw.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Ticks the current frame has been held for.
    #[inline]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Ticks each frame is held for.
    #[inline]
    pub fn repeat_max(&self) -> u32 {
        self.repeat_max
    }

    /// Number of loaded frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
