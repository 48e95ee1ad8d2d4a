//! Idle detection.
//!
//! A [`UsageTracker`] records the last time anything was looked up and
//! emits a single [`UsageEvent::Stalled`] once nothing happened for the
//! configured window. The next [`UsageTracker::touch`] re-arms it.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Events published by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEvent {
    /// No activity within the window.
    Stalled,
}

struct TrackerState {
    last_activity: Mutex<Instant>,
    stalled: AtomicBool,
    window: Duration,
    events: broadcast::Sender<UsageEvent>,
}

/// Shared activity tracker.
#[derive(Clone)]
pub struct UsageTracker {
    state: Arc<TrackerState>,
}

impl UsageTracker {
    pub fn new(window: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(TrackerState {
                last_activity: Mutex::new(Instant::now()),
                stalled: AtomicBool::new(false),
                window,
                events,
            }),
        }
    }

    /// Record activity.
    pub fn touch(&self) {
        *self.state.last_activity.lock() = Instant::now();
        self.state.stalled.store(false, Ordering::Release);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UsageEvent> {
        self.state.events.subscribe()
    }

    /// Time since the last activity.
    pub fn idle_for(&self) -> Duration {
        self.state.last_activity.lock().elapsed()
    }

    /// Emit a stall event if the window passed without activity and none
    /// was emitted since the last touch. Returns whether one was emitted.
    pub fn check(&self) -> bool {
        if self.idle_for() < self.state.window {
            return false;
        }
        if self.state.stalled.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!("No activity for {:?}, signalling stall", self.state.window);
        // No subscribers is fine.
        let _ = self.state.events.send(UsageEvent::Stalled);
        true
    }

    /// Poll for stalls in the background until the tracker is dropped.
    pub fn spawn_monitor(&self) -> JoinHandle<()> {
        let state: Weak<TrackerState> = Arc::downgrade(&self.state);
        let period = (self.state.window / 4).max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                UsageTracker { state }.check();
            }
        })
    }
}
