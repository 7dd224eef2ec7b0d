//! Timers for the question loop: the per-question countdown and the
//! short delay between quorum and the next question.
//!
//! Both timers are plain spawned tasks reporting through channels, so
//! they slot into a client's `tokio::select!` loop without the loop
//! having to track deadlines itself:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         ev = countdown.recv() => match ev {
//!             Some(CountdownEvent::Tick { remaining }) => { /* show timer */ }
//!             Some(CountdownEvent::Expired) => { /* auto-submit */ }
//!             None => {}
//!         }
//!     }
//! }
//! ```
//!
//! Dropping a timer aborts its task; a countdown that outlives its
//! question never fires into the next one.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Countdown settings. The defaults give the standard 10-second
/// question window with one tick per second.
#[derive(Debug, Clone)]
pub struct CountdownConfig {
    /// Seconds on the clock when a question is revealed.
    pub total_secs: u32,
    /// Real time between ticks. One second in production; tests
    /// shrink it to keep the suite fast.
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            total_secs: 10,
            tick_interval: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// Events emitted by a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// The clock changed. Emitted once immediately with the full
    /// window, then once per interval. `remaining` never reaches 0 —
    /// the final interval emits [`CountdownEvent::Expired`] instead.
    Tick { remaining: u32 },
    /// The window closed without the clock being cancelled.
    Expired,
}

/// A running per-question countdown.
///
/// Starts ticking on construction. `remaining` at each tick is the
/// number of whole intervals left, which is also the value scoring
/// uses for the speed bonus.
pub struct Countdown {
    events: UnboundedReceiver<CountdownEvent>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Start a countdown. The first event (the full window) is already
    /// in the channel when this returns.
    pub fn start(config: CountdownConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(total_secs = config.total_secs, "countdown started");
        let task = tokio::spawn(run_countdown(config, tx));
        Self { events: rx, task }
    }

    /// Next countdown event. `None` once the countdown has expired and
    /// the channel drained.
    pub async fn recv(&mut self) -> Option<CountdownEvent> {
        self.events.recv().await
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_countdown(config: CountdownConfig, tx: UnboundedSender<CountdownEvent>) {
    // Receiver dropped mid-question means the countdown was cancelled;
    // just stop ticking.
    if tx.send(CountdownEvent::Tick { remaining: config.total_secs }).is_err() {
        return;
    }
    for remaining in (0..config.total_secs).rev() {
        time::sleep(config.tick_interval).await;
        let event = if remaining == 0 {
            CountdownEvent::Expired
        } else {
            CountdownEvent::Tick { remaining }
        };
        trace!(?event, "countdown tick");
        if tx.send(event).is_err() {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Advance delay
// ---------------------------------------------------------------------------

/// The pause between "everyone has answered" and the next question,
/// long enough for players to see the highlighted answer.
///
/// Fires exactly once through the notification channel, unless
/// cancelled (dropped) first.
pub struct AdvanceDelay {
    task: JoinHandle<()>,
}

impl AdvanceDelay {
    /// Schedule a notification after `delay`.
    pub fn schedule(delay: Duration, notify: UnboundedSender<()>) -> Self {
        debug!(delay_ms = delay.as_millis() as u64, "advance delay scheduled");
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = notify.send(());
        });
        Self { task }
    }
}

impl Drop for AdvanceDelay {
    fn drop(&mut self) {
        self.task.abort();
    }
}
