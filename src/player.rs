//! The frame-sequence player: preloading, scheduling and drawing wired together.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;

use crate::animation::{PlayRequest, PlaybackPhase, PlaybackState, Tick};
use crate::geometry::backing_size;
use crate::render::render_frame;
use crate::scheduler::{drive, TickFlow, TickTask};
use crate::{
    preload, FrameClock, ImageLoader, NoopEvents, PlaybackSettings, PlayerError, PlayerEvents, PreloadError,
    RenderError, Surface,
};

/// Everything a [`FramePlayer`] needs at construction.
pub struct PlayerConfig<S, L, C> {
    /// Serialisable playback settings
    pub settings: PlaybackSettings,
    /// Destination surface
    pub surface: S,
    /// Image source decoder
    pub loader: L,
    /// Refresh and timer source
    pub clock: C,
    /// Executor for the preload and tick tasks
    pub spawner: Rc<dyn LocalSpawn>,
    /// Lifecycle hooks
    pub events: Rc<dyn PlayerEvents>,
}

impl<S, L, C> PlayerConfig<S, L, C> {
    /// Configuration with no-op lifecycle hooks.
    pub fn new(settings: PlaybackSettings, surface: S, loader: L, clock: C, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            settings,
            surface,
            loader,
            clock,
            spawner,
            events: Rc::new(NoopEvents),
        }
    }

    /// Replace the lifecycle hooks.
    pub fn with_events(mut self, events: Rc<dyn PlayerEvents>) -> Self {
        self.events = events;
        self
    }
}

struct Shared<S: Surface, L, C> {
    state: RefCell<PlaybackState>,
    frames: RefCell<Vec<S::Image>>,
    surface: RefCell<S>,
    loader: Rc<L>,
    clock: Rc<C>,
    spawner: Rc<dyn LocalSpawn>,
    events: Rc<dyn PlayerEvents>,
    sources: Vec<String>,
    delay: Duration,
    load_timeout: Option<Duration>,
    ticker: RefCell<TickTask>,
    preloading: RefCell<Option<AbortHandle>>,
    load_error: RefCell<Option<PreloadError>>,
    destroyed: Cell<bool>,
}

/// Plays an ordered list of still images onto a surface at a fixed rate.
///
/// Preloading starts at construction. All work runs on the spawner's
/// thread; at most one tick chain exists at any time.
///
/// ## Example
///
/// ```rust
/// use frameseq_player::{FileLoader, FramePlayer, PlaybackSettings, PlayerConfig, RasterSurface, ThreadClock};
/// use futures::executor::LocalPool;
/// use std::rc::Rc;
///
/// let pool = LocalPool::new();
/// let settings = PlaybackSettings::new(["frames/001.png", "frames/002.png"])
///     .with_size(320, 240)
///     .with_delay_ms(40);
/// let config = PlayerConfig::new(
///     settings,
///     RasterSurface::new(320, 240),
///     FileLoader::new(),
///     ThreadClock::default(),
///     Rc::new(pool.spawner()),
/// );
/// let player = FramePlayer::new(config).unwrap();
/// player.play(); // starts once both frames are decoded
/// ```
pub struct FramePlayer<S: Surface, L, C> {
    shared: Rc<Shared<S, L, C>>,
}

impl<S, L, C> FramePlayer<S, L, C>
where
    S: Surface + 'static,
    L: ImageLoader<Image = S::Image> + 'static,
    C: FrameClock + 'static,
{
    /// Validate the configuration, size the surface and start preloading.
    pub fn new(config: PlayerConfig<S, L, C>) -> Result<Self, PlayerError> {
        let PlayerConfig {
            settings,
            mut surface,
            loader,
            clock,
            spawner,
            events,
        } = config;
        settings.validate()?;

        let (logical_w, logical_h) = surface.logical_size();
        let width = settings.width.unwrap_or(logical_w);
        let height = settings.height.unwrap_or(logical_h);
        let (backing_w, backing_h) = backing_size(width, height, surface.device_pixel_ratio())?;
        surface.set_backing_size(backing_w, backing_h);
        log::debug!(
            "surface {}x{} backed by {}x{} pixels",
            width,
            height,
            backing_w,
            backing_h
        );

        let shared = Rc::new(Shared {
            state: RefCell::new(PlaybackState::new(settings.hold_ticks)),
            frames: RefCell::new(Vec::new()),
            surface: RefCell::new(surface),
            loader: Rc::new(loader),
            clock: Rc::new(clock),
            spawner,
            events,
            delay: settings.delay(),
            load_timeout: settings.load_timeout(),
            sources: settings.sources,
            ticker: RefCell::new(TickTask::new()),
            preloading: RefCell::new(None),
            load_error: RefCell::new(None),
            destroyed: Cell::new(false),
        });
        shared.start_preload()?;
        Ok(Self { shared })
    }

    /// Start or resume playback.
    ///
    /// Before the images are loaded this records the request, and playback
    /// begins as soon as loading completes. Calling it while playing does nothing.
    pub fn play(&self) {
        self.shared.play();
    }
}

impl<S: Surface, L, C> FramePlayer<S, L, C> {
    /// Stop advancing frames, keeping the current position.
    ///
    /// The pending tick is cancelled, so no frame is drawn after this returns.
    pub fn pause(&self) {
        self.shared.pause();
    }

    /// Cancel all scheduled work. Later `play()` calls do nothing.
    pub fn destroy(&self) {
        self.shared.destroy();
    }

    /// Current playback phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.shared.state.borrow().phase()
    }

    /// Whether frames are currently advancing.
    pub fn is_playing(&self) -> bool {
        self.shared.state.borrow().is_playing()
    }

    /// Whether every image has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.shared.state.borrow().is_loaded()
    }

    /// Index of the next frame to draw.
    pub fn frame_index(&self) -> usize {
        self.shared.state.borrow().frame_index()
    }

    /// Number of frames in the sequence.
    pub fn frame_count(&self) -> usize {
        self.shared.sources.len()
    }

    /// Why the last preload failed, if it did.
    pub fn load_error(&self) -> Option<PreloadError> {
        self.shared.load_error.borrow().clone()
    }

    /// Backing store size in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        self.shared.surface.borrow().backing_size()
    }

    /// Borrow the destination surface.
    ///
    /// Do not hold the borrow across a tick.
    pub fn surface(&self) -> Ref<'_, S> {
        self.shared.surface.borrow()
    }
}

impl<S: Surface, L, C> Drop for FramePlayer<S, L, C> {
    fn drop(&mut self) {
        self.shared.destroy();
    }
}

impl<S, L, C> Shared<S, L, C>
where
    S: Surface + 'static,
    L: ImageLoader<Image = S::Image> + 'static,
    C: FrameClock + 'static,
{
    fn start_preload(self: &Rc<Self>) -> Result<(), PlayerError> {
        let weak = Rc::downgrade(self);
        let loader = Rc::clone(&self.loader);
        let clock = Rc::clone(&self.clock);
        let events = Rc::clone(&self.events);
        let sources = self.sources.clone();
        let timeout = self.load_timeout;

        let (task, handle) = abortable(async move {
            let result = preload(&*loader, &*clock, &sources, timeout, |progress| {
                events.on_load_progress(progress.completed, progress.total)
            })
            .await;
            if let Some(shared) = weak.upgrade() {
                shared.finish_preload(result);
            }
        });
        self.spawner.spawn_local(task.map(drop))?;
        *self.preloading.borrow_mut() = Some(handle);
        log::debug!("preloading {} images", self.sources.len());
        Ok(())
    }

    fn finish_preload(self: &Rc<Self>, result: Result<Vec<S::Image>, PreloadError>) {
        self.preloading.borrow_mut().take();
        match result {
            Ok(images) => {
                let count = images.len();
                *self.frames.borrow_mut() = images;
                *self.load_error.borrow_mut() = None;
                let first = self.state.borrow_mut().mark_loaded(count);
                if first {
                    log::info!("{} frames ready", count);
                    self.events.on_ready();
                }
                let resume = self.state.borrow_mut().take_pending_play();
                if resume {
                    self.play();
                }
            }
            Err(err) => {
                self.state.borrow_mut().halt();
                *self.load_error.borrow_mut() = Some(err.clone());
                self.events.on_error(&PlayerError::Preload(err));
            }
        }
    }

    fn play(self: &Rc<Self>) {
        if self.destroyed.get() {
            return;
        }
        let request = self.state.borrow_mut().request_play();
        match request {
            PlayRequest::AlreadyPlaying => {}
            PlayRequest::AwaitLoad => {
                if self.preloading.borrow().is_some() {
                    log::debug!("play requested before images loaded; deferring");
                    return;
                }
                log::debug!("play requested without images; loading again");
                if let Err(err) = self.start_preload() {
                    self.state.borrow_mut().halt();
                    self.report(err);
                }
            }
            PlayRequest::Start => {
                if let Err(err) = self.start_ticking() {
                    self.state.borrow_mut().halt();
                    self.report(err);
                }
            }
        }
    }

    fn start_ticking(self: &Rc<Self>) -> Result<(), PlayerError> {
        let weak = Rc::downgrade(self);
        let clock = Rc::clone(&self.clock);
        let delay = self.delay;
        self.ticker.borrow_mut().start(&*self.spawner, move |generation| {
            drive(clock, delay, move || match weak.upgrade() {
                Some(shared) => shared.tick(generation),
                None => TickFlow::Stop,
            })
        })?;
        Ok(())
    }

    fn tick(&self, generation: u64) -> TickFlow {
        if !self.ticker.borrow().is_current(generation) {
            return TickFlow::Stop;
        }
        let tick = self.state.borrow_mut().tick();
        match tick {
            Tick::Render(index) => {
                let drawn = {
                    let frames = self.frames.borrow();
                    match frames.get(index) {
                        Some(image) => render_frame(&mut *self.surface.borrow_mut(), image).map(drop),
                        None => Err(RenderError::MissingFrame { index }),
                    }
                };
                match drawn {
                    Ok(()) => {
                        self.events.on_playing(index);
                        TickFlow::Continue
                    }
                    Err(err) => {
                        self.state.borrow_mut().halt();
                        self.ticker.borrow_mut().finish(generation);
                        self.report(err.into());
                        TickFlow::Stop
                    }
                }
            }
            Tick::Ended => {
                self.ticker.borrow_mut().finish(generation);
                log::info!("playback ended");
                self.events.on_ended();
                TickFlow::Stop
            }
            Tick::Halted => {
                self.ticker.borrow_mut().finish(generation);
                TickFlow::Stop
            }
        }
    }
}

impl<S: Surface, L, C> Shared<S, L, C> {
    fn pause(&self) {
        let paused = self.state.borrow_mut().pause();
        if paused {
            self.ticker.borrow_mut().cancel();
            log::debug!("paused at frame {}", self.state.borrow().frame_index());
            self.events.on_paused();
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.state.borrow_mut().halt();
        self.ticker.borrow_mut().cancel();
        if let Some(handle) = self.preloading.borrow_mut().take() {
            handle.abort();
        }
        log::debug!("player destroyed");
    }

    fn report(&self, err: PlayerError) {
        log::warn!("{}", err);
        self.events.on_error(&err);
    }
}
