//! Background device monitor tied to a session.
//!
//! A monitor runs one [`DeviceMonitor::check`] per interval until it asks to
//! stop or is cancelled. Cancellation is fire-and-forget: the handle signals
//! the task and returns at once, abandoning any cycle still in progress.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, trace};

/// Outcome of one monitor cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    /// Keep monitoring.
    Continue,
    /// End the monitor task.
    Stop,
}

/// Periodic work run alongside an open session.
pub trait DeviceMonitor: Send + 'static {
    /// Run one monitor cycle.
    fn check(&mut self) -> MonitorStatus;
}

impl<F> DeviceMonitor for F
where
    F: FnMut() -> MonitorStatus + Send + 'static,
{
    fn check(&mut self) -> MonitorStatus {
        self()
    }
}

/// Handle to a running monitor task.
#[derive(Debug)]
pub struct MonitorHandle {
    inner: MonitorInner,
}

#[derive(Debug)]
enum MonitorInner {
    Thread {
        cancel: Sender<()>,
        thread: JoinHandle<()>,
    },
    #[cfg(feature = "async")]
    Task {
        token: tokio_util::sync::CancellationToken,
        task: tokio::task::JoinHandle<()>,
    },
}

impl MonitorHandle {
    /// Run `monitor` on a dedicated named thread, once per `interval`.
    pub fn spawn<M: DeviceMonitor>(
        name: &str,
        interval: Duration,
        mut monitor: M,
    ) -> std::io::Result<Self> {
        check_interval(interval)?;
        let (cancel, cancelled) = mpsc::channel::<()>();
        let label = name.to_string();
        let thread = std::thread::Builder::new()
            .name(format!("hidlink-monitor-{name}"))
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    trace!(monitor = %label, "monitor cycle");
                    if monitor.check() == MonitorStatus::Stop {
                        break;
                    }
                }
                debug!(monitor = %label, "monitor exited");
            })?;

        Ok(Self {
            inner: MonitorInner::Thread { cancel, thread },
        })
    }

    /// Run `monitor` as a tokio task, once per `interval`.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn spawn_async<M: DeviceMonitor>(
        name: &str,
        interval: Duration,
        mut monitor: M,
    ) -> std::io::Result<Self> {
        check_interval(interval)?;
        let token = tokio_util::sync::CancellationToken::new();
        let child = token.clone();
        let label = name.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        trace!(monitor = %label, "monitor cycle");
                        if monitor.check() == MonitorStatus::Stop {
                            break;
                        }
                    }
                }
            }
            debug!(monitor = %label, "monitor exited");
        });

        Ok(Self {
            inner: MonitorInner::Task { token, task },
        })
    }

    /// Signal the monitor to stop without waiting for it.
    pub fn cancel(self) {
        match self.inner {
            MonitorInner::Thread { cancel, thread } => {
                // The thread may already have stopped on its own.
                let _ = cancel.send(());
                drop(thread);
            }
            #[cfg(feature = "async")]
            MonitorInner::Task { token, task } => {
                token.cancel();
                drop(task);
            }
        }
    }

    /// True once the monitor task has exited.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            MonitorInner::Thread { thread, .. } => thread.is_finished(),
            #[cfg(feature = "async")]
            MonitorInner::Task { task, .. } => task.is_finished(),
        }
    }
}

fn check_interval(interval: Duration) -> std::io::Result<()> {
    if interval.is_zero() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "monitor interval must be greater than zero",
        ));
    }
    Ok(())
}
