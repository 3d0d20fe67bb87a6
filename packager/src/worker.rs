//! Background build execution.
//!
//! [`BuildWorker::spawn`] runs [`run_build`] on a dedicated thread. The
//! caller receives [`BuildEvent`]s over a channel and may request
//! cancellation at any time. Every run ends with exactly one terminal event.

use crate::error::{PackagerError, Result};
use crate::events::{BuildEvent, CancellationToken, ChannelObserver};
use crate::pipeline::{BuildOutcome, BuildRun, BuildTools, run_build};
use crate::tool::{CommandExecutor, SevenZip};
use log::debug;
use std::any::Any;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Starts builds on background threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildWorker;

impl BuildWorker {
    /// Spawns a thread that runs `run` with the given compressor setup.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the thread cannot be created.
    pub fn spawn(
        run: BuildRun,
        executor: Box<dyn CommandExecutor + Send>,
        seven_zip: Option<SevenZip>,
    ) -> Result<BuildHandle> {
        let (sender, events) = mpsc::channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let join = thread::Builder::new()
            .name("uepack-build".to_owned())
            .spawn(move || {
                let observer = ChannelObserver::new(sender);
                let tools = BuildTools {
                    executor: executor.as_ref(),
                    seven_zip: seven_zip.as_ref(),
                };
                let terminal = match run_build(&run, tools, &observer, &worker_cancel) {
                    Ok(BuildOutcome::Completed(paths)) => BuildEvent::Finished(paths),
                    Ok(BuildOutcome::Canceled) => BuildEvent::Canceled,
                    Err(err) => {
                        debug!(target: "uepack::worker", "build failed: {err:?}");
                        BuildEvent::Failed(err.to_string())
                    }
                };
                observer.send(terminal);
            })?;

        Ok(BuildHandle {
            cancel,
            events,
            join,
        })
    }
}

/// Controls and observes one background build.
#[derive(Debug)]
pub struct BuildHandle {
    cancel: CancellationToken,
    events: Receiver<BuildEvent>,
    join: JoinHandle<()>,
}

impl BuildHandle {
    /// Requests cancellation; the build stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a token that cancels this build, for use from other threads.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the event stream. Iteration ends once the worker exits.
    #[must_use]
    pub const fn events(&self) -> &Receiver<BuildEvent> {
        &self.events
    }

    /// Waits for the worker thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::WorkerPanicked`] when the thread panicked.
    pub fn join(self) -> Result<()> {
        self.join.join().map_err(|payload| PackagerError::WorkerPanicked {
            message: panic_message(payload.as_ref()),
        })
    }

    /// Drains events until the terminal one, handing each to `on_event`, then
    /// joins the worker and returns the terminal event.
    ///
    /// With a `timeout`, the build is cancelled once it elapses and waiting
    /// continues until the worker reaches its next checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::WorkerPanicked`] when the thread panicked
    /// before reporting an outcome.
    pub fn wait(
        self,
        timeout: Option<Duration>,
        mut on_event: impl FnMut(&BuildEvent),
    ) -> Result<BuildEvent> {
        let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));
        let mut terminal = None;
        while let Some(event) = self.next_event(deadline) {
            on_event(&event);
            if event.is_terminal() {
                terminal = Some(event);
                break;
            }
        }
        self.join()?;
        terminal.ok_or_else(|| PackagerError::WorkerPanicked {
            message: "worker exited without reporting an outcome".to_owned(),
        })
    }

    fn next_event(&self, deadline: Option<Instant>) -> Option<BuildEvent> {
        loop {
            let Some(at) = deadline.filter(|_| !self.cancel.is_cancelled()) else {
                return self.events.recv().ok();
            };
            match self.events.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Timeout) => {
                    debug!(target: "uepack::worker", "deadline reached; cancelling build");
                    self.cancel();
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
