//! Build event sinks and cooperative cancellation.
//!
//! A build reports to a [`BuildObserver`] and polls a [`CancellationToken`].
//! Both are injected per run. [`ChannelObserver`] forwards events to another
//! thread; [`RecordingObserver`] keeps them in memory.

use camino::Utf8PathBuf;
use log::trace;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Receives user-facing log lines and progress percentages from a build.
#[cfg_attr(test, mockall::automock)]
pub trait BuildObserver {
    /// Called with one human-readable log line.
    fn on_log(&self, line: &str);

    /// Called with a completion percentage in `0..=100`.
    fn on_progress(&self, percent: u8);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BuildObserver for NullObserver {
    fn on_log(&self, _line: &str) {}

    fn on_progress(&self, _percent: u8) {}
}

/// Requests cancellation of a running build.
///
/// Clones share one flag. The build observes it only between steps; an
/// in-flight compressor run or file copy always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything a background build reports, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A log line.
    Log(String),
    /// A progress percentage.
    Progress(u8),
    /// The build completed and produced these archives.
    Finished(Vec<Utf8PathBuf>),
    /// The build stopped with this error message.
    Failed(String),
    /// The build stopped at a cancellation checkpoint.
    Canceled,
}

impl BuildEvent {
    /// Returns true for the events that end a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Failed(_) | Self::Canceled)
    }
}

/// Forwards log and progress events over a channel.
///
/// Events sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<BuildEvent>,
}

impl ChannelObserver {
    /// Wraps the sending half of a channel.
    #[must_use]
    pub const fn new(sender: Sender<BuildEvent>) -> Self {
        Self { sender }
    }

    /// Sends an arbitrary event, such as a terminal outcome.
    pub fn send(&self, event: BuildEvent) {
        if self.sender.send(event).is_err() {
            trace!(target: "uepack::events", "event receiver dropped");
        }
    }
}

impl BuildObserver for ChannelObserver {
    fn on_log(&self, line: &str) {
        self.send(BuildEvent::Log(line.to_owned()));
    }

    fn on_progress(&self, percent: u8) {
        self.send(BuildEvent::Progress(percent));
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    logs: RefCell<Vec<String>>,
    progress: RefCell<Vec<u8>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the log lines received so far.
    #[must_use]
    pub fn logs(&self) -> Vec<String> {
        self.logs.borrow().clone()
    }

    /// Returns the progress values received so far.
    #[must_use]
    pub fn progress(&self) -> Vec<u8> {
        self.progress.borrow().clone()
    }
}

impl BuildObserver for RecordingObserver {
    fn on_log(&self, line: &str) {
        self.logs.borrow_mut().push(line.to_owned());
    }

    fn on_progress(&self, percent: u8) {
        self.progress.borrow_mut().push(percent);
    }
}
