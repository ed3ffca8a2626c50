//! Timing sources for the frame scheduler.

use std::future::Future;
use std::time::Duration;

/// Refresh-aligned callbacks and non-blocking waits.
///
/// No `Send` bounds: works in both native and WASM (single-threaded) contexts.
pub trait FrameClock {
    /// Resolve at the next display refresh opportunity.
    fn next_frame(&self) -> impl Future<Output = ()>;

    /// Resolve once `duration` has elapsed, without blocking the thread.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Native clock that emulates a display refresh on a shared timer thread.
///
/// `next_frame` resolves on the next multiple of the refresh interval since
/// the clock was created. Both waits are [`futures_timer::Delay`]s, so a
/// dropped wait is removed from the timer and holds nothing afterwards.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct ThreadClock {
    refresh: Duration,
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for ThreadClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ThreadClock {
    /// Create a clock refreshing `refresh_hz` times per second.
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            refresh: Duration::from_secs(1) / refresh_hz.max(1),
            origin: std::time::Instant::now(),
        }
    }

    /// Interval between refresh opportunities.
    #[inline]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    fn until_next_refresh(&self) -> Duration {
        let refresh = self.refresh.as_nanos().max(1);
        let elapsed = self.origin.elapsed().as_nanos();
        let remaining = refresh - elapsed % refresh;
        Duration::from_nanos(remaining as u64)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameClock for ThreadClock {
    fn next_frame(&self) -> impl Future<Output = ()> {
        futures_timer::Delay::new(self.until_next_refresh())
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        futures_timer::Delay::new(duration)
    }
}

/// Browser clock using `requestAnimationFrame` and `setTimeout`.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;

    /// Clock driven by the browser's event loop.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct WebClock;

    impl WebClock {
        /// Create a browser clock.
        pub fn new() -> Self {
            Self
        }
    }

    async fn settle(promise: js_sys::Promise) {
        let _ = JsFuture::from(promise).await;
    }

    impl FrameClock for WebClock {
        fn next_frame(&self) -> impl Future<Output = ()> {
            let promise = js_sys::Promise::new(&mut |resolve, _| {
                let requested = web_sys::window()
                    .map(|window| window.request_animation_frame(&resolve).is_ok())
                    .unwrap_or(false);
                if !requested {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            });
            settle(promise)
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
            let millis = duration.as_millis().min(i32::MAX as u128) as i32;
            let promise = js_sys::Promise::new(&mut |resolve, _| {
                let scheduled = web_sys::window()
                    .map(|window| {
                        window
                            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                            .is_ok()
                    })
                    .unwrap_or(false);
                if !scheduled {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            });
            settle(promise)
        }
    }
}
