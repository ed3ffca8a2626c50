//! Frame scheduler: one refresh-aligned, delay-throttled tick chain at a time.

use std::rc::Rc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle, Future};
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use futures::FutureExt;

use crate::FrameClock;

/// Whether the tick chain keeps going after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFlow {
    /// Wait the frame delay, then tick again on the next refresh
    Continue,
    /// Leave the chain
    Stop,
}

/// Run ticks until one returns [`TickFlow::Stop`].
///
/// Each iteration waits for a refresh, runs `tick`, then waits `delay`
/// before requesting the next refresh, so at most one tick is ever in
/// flight and ticks never overlap.
pub async fn drive<C, F>(clock: Rc<C>, delay: Duration, mut tick: F)
where
    C: FrameClock,
    F: FnMut() -> TickFlow,
{
    loop {
        clock.next_frame().await;
        match tick() {
            TickFlow::Continue => clock.sleep(delay).await,
            TickFlow::Stop => break,
        }
    }
}

/// Handle to the currently scheduled tick chain.
///
/// Starting a chain cancels the previous one, and every chain carries a
/// generation number so a tick can tell whether it is still current.
#[derive(Debug, Default)]
pub struct TickTask {
    handle: Option<AbortHandle>,
    generation: u64,
}

impl TickTask {
    /// Handle with no chain running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any running chain and spawn `chain(generation)` in its place.
    pub fn start<F, Fut>(&mut self, spawner: &dyn LocalSpawn, chain: F) -> Result<u64, SpawnError>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        self.cancel();
        let generation = self.generation.wrapping_add(1);
        let (task, handle) = abortable(chain(generation));
        spawner.spawn_local(task.map(drop))?;
        self.generation = generation;
        self.handle = Some(handle);
        log::debug!("tick chain {generation} scheduled");
        Ok(generation)
    }

    /// Abort the running chain. Returns `true` if one was running.
    ///
    /// An aborted chain is never polled again, so a pending refresh or delay
    /// it was waiting on cannot produce another tick.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                log::debug!("tick chain {} cancelled", self.generation);
                true
            }
            None => false,
        }
    }

    /// Mark the chain of `generation` as finished on its own.
    pub fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.handle = None;
        }
    }

    /// `true` while the chain of `generation` is the live one.
    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    /// Whether a chain is running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Generation of the most recently started chain.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Spawner backed by `wasm_bindgen_futures::spawn_local`.
#[cfg(feature = "web")]
pub mod web {
    use futures::future::LocalFutureObj;
    use futures::task::{LocalSpawn, SpawnError};

    /// Spawns onto the browser microtask queue.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct WebSpawner;

    impl LocalSpawn for WebSpawner {
        fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            wasm_bindgen_futures::spawn_local(future);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;
    use futures::executor::LocalPool;
    use std::cell::Cell;

    #[test]
    fn test_drive_waits_refresh_then_delay() {
        let mut pool = LocalPool::new();
        let clock = Rc::new(ManualClock::new());
        let ticks = Rc::new(Cell::new(0));

        let counter = Rc::clone(&ticks);
        pool.spawner()
            .spawn_local(drive(Rc::clone(&clock), Duration::from_millis(100), move || {
                counter.set(counter.get() + 1);
                if counter.get() == 3 {
                    TickFlow::Stop
                } else {
                    TickFlow::Continue
                }
            }))
            .unwrap();

        pool.run_until_stalled();
        assert_eq!(ticks.get(), 0);
        assert_eq!(clock.pending_frames(), 1);

        clock.fire_frame();
        pool.run_until_stalled();
        assert_eq!(ticks.get(), 1);
        // waiting on the delay, not on a refresh
        assert_eq!(clock.pending_frames(), 0);
        clock.fire_frame();
        pool.run_until_stalled();
        assert_eq!(ticks.get(), 1);

        clock.advance(Duration::from_millis(99));
        pool.run_until_stalled();
        assert_eq!(clock.pending_frames(), 0);
        clock.advance(Duration::from_millis(1));
        pool.run_until_stalled();
        assert_eq!(clock.pending_frames(), 1);

        clock.fire_frame();
        pool.run_until_stalled();
        clock.advance(Duration::from_millis(100));
        pool.run_until_stalled();
        clock.fire_frame();
        pool.run_until_stalled();
        assert_eq!(ticks.get(), 3);
        assert_eq!(clock.pending_frames(), 0);
        assert_eq!(clock.pending_timers(), 0);
    }

    #[test]
    fn test_restart_cancels_previous_chain() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let clock = Rc::new(ManualClock::new());
        let ticks = Rc::new(Cell::new(0));
        let mut task = TickTask::new();

        for _ in 0..3 {
            let clock = Rc::clone(&clock);
            let counter = Rc::clone(&ticks);
            task.start(&spawner, move |_| {
                drive(clock, Duration::ZERO, move || {
                    counter.set(counter.get() + 1);
                    TickFlow::Stop
                })
            })
            .unwrap();
        }
        assert_eq!(task.generation(), 3);
        assert!(task.is_current(3));
        assert!(!task.is_current(2));

        pool.run_until_stalled();
        assert_eq!(clock.pending_frames(), 1);

        clock.fire_frame();
        pool.run_until_stalled();
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn test_cancel_and_finish() {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let mut task = TickTask::new();
        assert!(!task.cancel());

        let generation = task.start(&spawner, |_| async {}).unwrap();
        assert!(task.is_active());
        task.finish(generation + 1);
        assert!(task.is_active());
        task.finish(generation);
        assert!(!task.is_active());

        task.start(&spawner, |_| async {}).unwrap();
        assert!(task.cancel());
        assert!(!task.is_active());
    }
}
