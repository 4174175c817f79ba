//! Background thread running refresh passes on the registry's period.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::app::AppContext;
use crate::domain::{AppError, refresh_period};

const MINUTE: Duration = Duration::from_secs(60);

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Length of one interval "minute". Shortened in tests.
    pub unit: Duration,
    /// Run a pass as soon as the scheduler starts instead of after one period.
    pub run_on_start: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self { unit: MINUTE, run_on_start: false }
    }
}

/// Handle to the refresh thread. Dropping it stops the thread after any running pass.
#[derive(Debug)]
pub struct RefreshScheduler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start the refresh loop on a dedicated thread.
    pub fn spawn(context: AppContext, options: SchedulerOptions) -> Result<Self, AppError> {
        let (stop, stopped) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("yamlprops-refresh".to_string())
            .spawn(move || run_loop(&context, options, &stopped))?;

        Ok(Self { stop: Some(stop), handle: Some(handle) })
    }

    /// Signal the loop to exit and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Block until the loop exits on its own (it only does so once stopped).
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("refresh thread panicked");
        }
    }

    fn shutdown(&mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("refresh thread panicked");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(context: &AppContext, options: SchedulerOptions, stopped: &mpsc::Receiver<()>) {
    info!("refresh scheduler started");
    // Triggers fall on `anchor + period`, `anchor + 2 * period`, ...
    let mut anchor = Instant::now();

    if options.run_on_start {
        let period = current_period(context, options.unit);
        run_pass(context, period);
        if let Some(period) = period {
            anchor = skip_elapsed_triggers(anchor, period, Instant::now());
        }
    }

    loop {
        // Interval changes may come from another process sharing the state file.
        if let Err(err) = context.registry().reload() {
            warn!(error = %err, "could not reload registry state; keeping the loaded copy");
        }

        let Some(period) = current_period(context, options.unit) else {
            if wait_for_stop(stopped, options.unit) {
                break;
            }
            anchor = Instant::now();
            continue;
        };

        let due = anchor + period;
        let now = Instant::now();
        if now < due {
            if wait_for_stop(stopped, (due - now).min(options.unit)) {
                break;
            }
            continue;
        }

        run_pass(context, Some(period));
        anchor = skip_elapsed_triggers(due, period, Instant::now());
    }
    info!("refresh scheduler stopped");
}

fn current_period(context: &AppContext, unit: Duration) -> Option<Duration> {
    let minutes = context.registry().refresh_interval_minutes();
    let period = refresh_period(minutes, unit);
    if period.is_none() {
        debug!(refresh_interval_minutes = minutes, "scheduled refresh disabled");
    }
    period
}

/// Anchor for the next trigger after a pass that ran for trigger `due`.
///
/// Triggers that fell due while the pass was running are dropped, not run back to back.
fn skip_elapsed_triggers(due: Instant, period: Duration, now: Instant) -> Instant {
    let mut anchor = due;
    let mut skipped = 0u32;
    while anchor + period <= now {
        anchor += period;
        skipped += 1;
    }
    if skipped > 0 {
        warn!(skipped, "refresh pass overran its period; skipping missed triggers");
    }
    anchor
}

/// Returns true when the scheduler should exit.
fn wait_for_stop(stopped: &mpsc::Receiver<()>, timeout: Duration) -> bool {
    match stopped.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

fn run_pass(context: &AppContext, period: Option<Duration>) {
    info!("refreshing configs");
    match context.registry().refresh_all(context.repository(), context.credentials()) {
        Ok(report) => {
            let next = period
                .and_then(|p| chrono::Duration::from_std(p).ok())
                .map(|p| (Utc::now() + p).to_rfc3339());
            info!(
                refreshed = report.refreshed.len(),
                failed = report.failures.len(),
                duration_ms = report.duration.as_millis() as u64,
                next_refresh = next.as_deref().unwrap_or("on schedule"),
                "refresh pass finished"
            );
        }
        Err(AppError::RefreshInProgress) => {
            warn!("a refresh pass is already running; skipping this trigger");
        }
        Err(err) => error!(error = %err, "refresh pass failed"),
    }
}
