//! Edge auto-scroll while dragging blocks in the preview.
//!
//! While a drag is active, a frame-cadence ticker checks how close the
//! pointer is to the top or bottom edge and emits a scroll delta that grows
//! as the pointer approaches the edge. The ticker is cancelled on
//! [`AutoScroll::stop`] and when the handle is dropped.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::trace;

/// One animation frame at 60 Hz
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub height: f64,

    /// Distance from an edge at which scrolling starts
    pub edge_zone: f64,

    /// Pixels per frame with the pointer right at the edge
    pub max_speed: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            height: 800.0,
            edge_zone: 80.0,
            max_speed: 24.0,
        }
    }
}

impl Viewport {
    /// Scroll delta for one frame; negative scrolls up, zero outside the edge zones
    pub fn scroll_delta(&self, pointer_y: f64) -> f64 {
        if self.edge_zone <= 0.0 {
            return 0.0;
        }

        let top_depth = self.edge_zone - pointer_y;
        let bottom_depth = pointer_y - (self.height - self.edge_zone);

        if top_depth > 0.0 {
            -self.max_speed * (top_depth / self.edge_zone).min(1.0)
        } else if bottom_depth > 0.0 {
            self.max_speed * (bottom_depth / self.edge_zone).min(1.0)
        } else {
            0.0
        }
    }
}

/// Running auto-scroll for one drag
pub struct AutoScroll {
    pointer: watch::Sender<Option<f64>>,
    task: Option<JoinHandle<()>>,
}

impl AutoScroll {
    /// Start ticking on the current tokio runtime; `on_scroll` receives each non-zero delta
    pub fn start(viewport: Viewport, mut on_scroll: impl FnMut(f64) + Send + 'static) -> Self {
        let (pointer, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = interval(FRAME_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let pointer = *rx.borrow();
                let Some(y) = pointer else {
                    continue;
                };

                let delta = viewport.scroll_delta(y);
                if delta != 0.0 {
                    trace!(delta, "Auto-scroll frame");
                    on_scroll(delta);
                }
            }
        });

        Self {
            pointer,
            task: Some(task),
        }
    }

    /// Latest pointer position relative to the viewport top
    pub fn update_pointer(&self, y: f64) {
        self.pointer.send_replace(Some(y));
    }

    /// Pointer left the viewport; stop scrolling but keep the drag alive
    pub fn clear_pointer(&self) {
        self.pointer.send_replace(None);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the ticker (drag ended)
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AutoScroll {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_scroll_delta_zones() {
        let viewport = Viewport::default();

        assert_eq!(viewport.scroll_delta(400.0), 0.0);
        assert_eq!(viewport.scroll_delta(0.0), -24.0);
        assert_eq!(viewport.scroll_delta(40.0), -12.0);
        assert_eq!(viewport.scroll_delta(760.0), 12.0);
        assert_eq!(viewport.scroll_delta(900.0), 24.0);
    }

    fn counting() -> (Arc<AtomicUsize>, impl FnMut(f64) + Send + 'static) {
        let frames = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&frames);
        (frames, move |_: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_only_near_edges() {
        let (frames, on_scroll) = counting();
        let scroll = AutoScroll::start(Viewport::default(), on_scroll);

        scroll.update_pointer(400.0);
        tokio::time::sleep(FRAME_INTERVAL * 5).await;
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        scroll.update_pointer(10.0);
        tokio::time::sleep(FRAME_INTERVAL * 5).await;
        assert!(frames.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_ticker() {
        let (frames, on_scroll) = counting();
        let mut scroll = AutoScroll::start(Viewport::default(), on_scroll);
        scroll.update_pointer(0.0);
        tokio::time::sleep(FRAME_INTERVAL * 3).await;

        scroll.stop();
        tokio::task::yield_now().await;
        let after_stop = frames.load(Ordering::SeqCst);
        assert!(!scroll.is_running());

        tokio::time::sleep(FRAME_INTERVAL * 10).await;
        assert_eq!(frames.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticker() {
        let (frames, on_scroll) = counting();
        let scroll = AutoScroll::start(Viewport::default(), on_scroll);
        scroll.update_pointer(0.0);
        tokio::time::sleep(FRAME_INTERVAL * 2).await;

        drop(scroll);
        tokio::task::yield_now().await;
        let after_drop = frames.load(Ordering::SeqCst);

        tokio::time::sleep(FRAME_INTERVAL * 10).await;
        assert_eq!(frames.load(Ordering::SeqCst), after_drop);
    }
}
