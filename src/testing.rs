//! Deterministic doubles for the clock, loader, surface and event hooks.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;

use crate::geometry::Rect;
use crate::{FrameClock, FrameImage, ImageLoader, LoadError, PlayerError, PlayerEvents, RenderError, Surface};

/// Clock whose refreshes and timers only fire when the test says so.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    frames: RefCell<Vec<oneshot::Sender<()>>>,
    timers: RefCell<Vec<(Duration, oneshot::Sender<()>)>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every pending refresh callback.
    pub fn fire_frame(&self) -> usize {
        let waiting: Vec<_> = self.frames.borrow_mut().drain(..).collect();
        waiting.into_iter().filter_map(|tx| tx.send(()).ok()).count()
    }

    /// Move time forward and fire every timer that is due.
    pub fn advance(&self, by: Duration) {
        let now = self.now.get() + by;
        self.now.set(now);
        let due: Vec<_> = {
            let mut timers = self.timers.borrow_mut();
            let (due, rest): (Vec<_>, Vec<_>) = timers.drain(..).partition(|(deadline, _)| *deadline <= now);
            *timers = rest;
            due
        };
        for (_, tx) in due {
            let _ = tx.send(());
        }
    }

    /// Refresh callbacks that still have a live waiter.
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().iter().filter(|tx| !tx.is_canceled()).count()
    }

    /// Timers that still have a live waiter.
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().iter().filter(|(_, tx)| !tx.is_canceled()).count()
    }
}

impl FrameClock for ManualClock {
    fn next_frame(&self) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel();
        self.frames.borrow_mut().push(tx);
        async move {
            let _ = rx.await;
        }
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel();
        let deadline = self.now.get() + duration;
        self.timers.borrow_mut().push((deadline, tx));
        async move {
            let _ = rx.await;
        }
    }
}

/// Image stand-in that remembers which source produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl FrameImage for TestImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Loader with three kinds of sources:
/// `sync:*` completes on first poll, `fail:*` fails on first poll,
/// anything else waits until [`release`](Self::release) is called.
#[derive(Debug, Default)]
pub struct GatedLoader {
    gates: RefCell<Vec<(String, oneshot::Sender<()>)>>,
    calls: Cell<usize>,
}

impl GatedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the oldest load of `source` that still has a waiter.
    pub fn release(&self, source: &str) -> bool {
        let mut gates = self.gates.borrow_mut();
        match gates.iter().position(|(s, tx)| s == source && !tx.is_canceled()) {
            Some(pos) => gates.remove(pos).1.send(()).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ImageLoader for GatedLoader {
    type Image = TestImage;

    fn load(&self, source: &str) -> impl Future<Output = Result<TestImage, LoadError>> {
        self.calls.set(self.calls.get() + 1);
        let source = source.to_owned();
        let gate = if source.starts_with("sync:") || source.starts_with("fail:") {
            None
        } else {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().push((source.clone(), tx));
            Some(rx)
        };
        async move {
            if let Some(rx) = gate {
                rx.await.map_err(|_| LoadError::new(&source, "gate dropped"))?;
            }
            if source.starts_with("fail:") {
                return Err(LoadError::new(&source, "decode failed"));
            }
            Ok(TestImage {
                name: source,
                width: 800,
                height: 600,
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear(Rect),
    Draw { image: String, source: Rect, dest: Rect },
}

/// Surface that records every operation into a shared log.
#[derive(Debug)]
pub struct RecordingSurface {
    pub logical: (u32, u32),
    pub pixel_ratio: f64,
    pub backing: (u32, u32),
    pub log: Rc<RefCell<Vec<SurfaceOp>>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            logical: (width, height),
            pixel_ratio: 1.0,
            backing: (width, height),
            log: Rc::default(),
        }
    }

    /// Names of drawn images, in order.
    pub fn drawn(log: &RefCell<Vec<SurfaceOp>>) -> Vec<String> {
        log.borrow()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Draw { image, .. } => Some(image.clone()),
                SurfaceOp::Clear(_) => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    type Image = TestImage;

    fn logical_size(&self) -> (u32, u32) {
        self.logical
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
    }

    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn clear(&mut self, rect: Rect) -> Result<(), RenderError> {
        self.log.borrow_mut().push(SurfaceOp::Clear(rect));
        Ok(())
    }

    fn draw_image(&mut self, image: &TestImage, source: Rect, dest: Rect) -> Result<(), RenderError> {
        self.log.borrow_mut().push(SurfaceOp::Draw {
            image: image.name.clone(),
            source,
            dest,
        });
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Ready,
    Playing(usize),
    Paused,
    Ended,
    Progress(usize, usize),
    Error(String),
}

/// Events sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    pub events: RefCell<Vec<Event>>,
}

impl RecordingEvents {
    pub fn count(&self, event: &Event) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    pub fn frames(&self) -> Vec<usize> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Playing(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PlayerEvents for RecordingEvents {
    fn on_ready(&self) {
        self.events.borrow_mut().push(Event::Ready);
    }

    fn on_playing(&self, index: usize) {
        self.events.borrow_mut().push(Event::Playing(index));
    }

    fn on_paused(&self) {
        self.events.borrow_mut().push(Event::Paused);
    }

    fn on_ended(&self) {
        self.events.borrow_mut().push(Event::Ended);
    }

    fn on_load_progress(&self, completed: usize, total: usize) {
        self.events.borrow_mut().push(Event::Progress(completed, total));
    }

    fn on_error(&self, error: &PlayerError) {
        self.events.borrow_mut().push(Event::Error(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    #[test]
    fn test_manual_clock_fires_only_live_waiters() {
        let mut pool = LocalPool::new();
        let clock = Rc::new(ManualClock::new());
        let woke = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let (clock, woke) = (Rc::clone(&clock), Rc::clone(&woke));
            pool.spawner()
                .spawn_local(async move {
                    clock.next_frame().await;
                    woke.set(woke.get() + 1);
                })
                .unwrap();
        }
        pool.run_until_stalled();
        drop(clock.next_frame());

        assert_eq!(clock.pending_frames(), 2);
        assert_eq!(clock.fire_frame(), 2);
        pool.run_until_stalled();
        assert_eq!(woke.get(), 2);
        assert_eq!(clock.fire_frame(), 0);
    }

    #[test]
    fn test_manual_clock_timers_fire_when_due() {
        let mut pool = LocalPool::new();
        let clock = Rc::new(ManualClock::new());
        let done = Rc::new(Cell::new(false));
        {
            let (clock, done) = (Rc::clone(&clock), Rc::clone(&done));
            pool.spawner()
                .spawn_local(async move {
                    clock.sleep(Duration::from_millis(100)).await;
                    done.set(true);
                })
                .unwrap();
        }
        pool.run_until_stalled();

        clock.advance(Duration::from_millis(99));
        pool.run_until_stalled();
        assert!(!done.get());
        assert_eq!(clock.pending_timers(), 1);

        clock.advance(Duration::from_millis(1));
        pool.run_until_stalled();
        assert!(done.get());
        assert_eq!(clock.pending_timers(), 0);
    }
}
