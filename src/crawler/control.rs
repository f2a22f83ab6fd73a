//! Crawl control: cooperative stop, manual gate, and the controller front ends use
//!
//! A front end starts at most one crawl at a time through [`Controller`]. The
//! returned [`CrawlHandle`] is the only way to talk to the running worker:
//! drain its events, request a stop, answer the manual gate, and finally
//! collect the [`CrawlReport`].

use crate::config::Config;
use crate::crawler::coordinator::run_crawl;
use crate::output::{CrawlEvent, Reporter};
use crate::render::{DefaultLauncher, Launcher};
use crate::state::FinishReason;
use crate::SweepError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

/// Cooperative cancellation token shared between a front end and the worker
///
/// Setting it never interrupts an in-flight page load; the worker samples it
/// at its checkpoints. Sleeps and the manual gate wake up as soon as it is set.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    set: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop; idempotent
    pub fn stop(&self) {
        self.inner.set.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }

    /// Resolves once a stop has been requested
    pub async fn stopped(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// A human's answer at the manual gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    Cancel,
}

/// Front-end half of the manual-intervention gate
///
/// Consumed by answering. Dropping it unanswered counts as a cancel.
#[derive(Debug)]
pub struct ManualGate {
    tx: oneshot::Sender<GateDecision>,
}

impl ManualGate {
    /// Creates the gate and the receiver the worker awaits
    pub fn new() -> (Self, oneshot::Receiver<GateDecision>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn confirm(self) {
        self.answer(GateDecision::Continue);
    }

    pub fn cancel(self) {
        self.answer(GateDecision::Cancel);
    }

    fn answer(self, decision: GateDecision) {
        if self.tx.send(decision).is_err() {
            tracing::debug!("Crawl worker no longer waiting at the manual gate");
        }
    }
}

/// Final outcome of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub reason: FinishReason,
    pub pages_visited: u32,
    /// Every unique link collected, sorted
    pub links: Vec<String>,
    pub output_path: PathBuf,
}

impl CrawlReport {
    pub fn is_success(&self) -> bool {
        self.reason.is_success()
    }
}

/// Starts crawls, one at a time
#[derive(Clone)]
pub struct Controller {
    active: Arc<AtomicBool>,
    launcher: Arc<dyn Launcher>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Creates a controller that launches renderers with [`DefaultLauncher`]
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(DefaultLauncher))
    }

    pub fn with_launcher(launcher: Arc<dyn Launcher>) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            launcher,
        }
    }

    /// Whether a crawl started by this controller is still running
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Validates `config` and spawns the crawl worker
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlHandle)` - The worker is running
    /// * `Err(SweepError::Config)` - The configuration is invalid
    /// * `Err(SweepError::AlreadyRunning)` - Another crawl has not finished yet
    pub fn start(&self, config: Config) -> Result<CrawlHandle, SweepError> {
        config.validate()?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SweepError::AlreadyRunning);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let (reporter, events) = Reporter::channel();
        let stop = StopSignal::new();
        let (gate, gate_rx) = if config.manual_intervention {
            let (gate, rx) = ManualGate::new();
            (Some(gate), Some(rx))
        } else {
            (None, None)
        };

        let launcher = Arc::clone(&self.launcher);
        let worker_stop = stop.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            run_crawl(config, launcher.as_ref(), reporter, worker_stop, gate_rx).await
        });

        Ok(CrawlHandle {
            events,
            stop,
            gate,
            task,
        })
    }
}

/// Clears the controller's running flag when the worker ends, however it ends
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Front-end handle to a running crawl
pub struct CrawlHandle {
    events: mpsc::UnboundedReceiver<CrawlEvent>,
    stop: StopSignal,
    gate: Option<ManualGate>,
    task: JoinHandle<CrawlReport>,
}

impl CrawlHandle {
    /// Requests a cooperative stop
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// The manual gate, present once when manual intervention is enabled
    pub fn take_gate(&mut self) -> Option<ManualGate> {
        self.gate.take()
    }

    /// Next event, or None once the worker has finished and the stream is drained
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    /// Waits for the worker and returns its report
    pub async fn wait(self) -> Result<CrawlReport, SweepError> {
        self.task
            .await
            .map_err(|e| SweepError::Worker(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_signal_wakes_waiter() {
        let stop = StopSignal::new();
        let waiter = stop.clone();
        let task = tokio::spawn(async move { waiter.stopped().await });

        tokio::task::yield_now().await;
        stop.stop();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(stop.is_set());
    }

    #[tokio::test]
    async fn test_stopped_returns_immediately_when_set() {
        let stop = StopSignal::new();
        stop.stop();
        stop.stop();
        tokio::time::timeout(Duration::from_millis(100), stop.stopped())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_manual_gate_answers() {
        let (gate, rx) = ManualGate::new();
        gate.confirm();
        assert_eq!(rx.await.unwrap(), GateDecision::Continue);

        let (gate, rx) = ManualGate::new();
        gate.cancel();
        assert_eq!(rx.await.unwrap(), GateDecision::Cancel);

        let (gate, rx) = ManualGate::new();
        drop(gate);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let controller = Controller::new();
        let result = controller.start(Config::new(""));
        assert!(matches!(result, Err(SweepError::Config(_))));
        assert!(!controller.is_running());
    }
}
