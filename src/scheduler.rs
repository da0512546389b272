// src/scheduler.rs
//! Cron-driven run trigger with an owned handle.
//!
//! At most one run is in flight: a firing that lands while the previous run
//! is still executing is skipped and logged, never queued.

use std::collections::BTreeSet;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::agent::{Agent, RunError, RunOutcome};

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid cron expression {expr:?}: {reason}")]
    Invalid { expr: String, reason: String },
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scheduled_runs_total", "Scheduled firings that ran the pipeline.");
        describe_counter!("scheduled_runs_failed_total", "Scheduled runs that ended in an error.");
        describe_counter!("scheduled_runs_skipped_total", "Firings skipped because a run was in flight.");
    });
}

/// Rewrite a standard cron weekday field (`0`-`7`, Sunday = 0 or 7) into the
/// `cron` crate's numbering (`1`-`7`, Sunday = 1). Numeric ranges, lists and
/// steps are expanded to explicit days; names (`MON-FRI`) pass through.
fn standard_weekdays(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }
    let mut days = BTreeSet::new();
    let mut named = Vec::new();
    for part in field.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((b, s)) => {
                let step = s
                    .parse::<u32>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| format!("bad weekday step in {part:?}"))?;
                (b, Some(step))
            }
            None => (part, None),
        };
        let (lo, hi) = if base == "*" {
            (0, 6)
        } else if let Some((a, b)) = base.split_once('-') {
            match (a.parse::<u32>(), b.parse::<u32>()) {
                (Ok(a), Ok(b)) => (a, b),
                _ => {
                    named.push(part.to_string());
                    continue;
                }
            }
        } else {
            match base.parse::<u32>() {
                // `n/step` runs from n to the end of the week
                Ok(n) if step.is_some() => (n, 6),
                Ok(n) => (n, n),
                Err(_) => {
                    named.push(part.to_string());
                    continue;
                }
            }
        };
        if lo > hi || hi > 7 {
            return Err(format!("weekday {part:?} out of range 0-7"));
        }
        for d in (lo..=hi).step_by(step.unwrap_or(1) as usize) {
            days.insert(if d == 7 { 1 } else { d + 1 });
        }
    }
    let mut out: Vec<String> = days.iter().map(u32::to_string).collect();
    out.extend(named);
    Ok(out.join(","))
}

/// Validated cron schedule.
///
/// Five-field (minute-first) expressions follow standard cron: a `0` seconds
/// field is prepended and weekdays use `0`/`7` = Sunday, `1` = Monday.
/// Six and seven-field forms are handed to the `cron` crate as given
/// (`1` = Sunday).
#[derive(Debug, Clone)]
pub struct CronTrigger {
    expr: String,
    schedule: cron::Schedule,
}

impl CronTrigger {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let trimmed = expr.trim();
        let invalid = |reason: String| ScheduleError::Invalid {
            expr: expr.to_string(),
            reason,
        };
        let normalized = match trimmed.split_whitespace().count() {
            5 => {
                let fields: Vec<&str> = trimmed.split_whitespace().collect();
                let weekdays = standard_weekdays(fields[4]).map_err(invalid)?;
                format!("0 {} {weekdays}", fields[..4].join(" "))
            }
            6 | 7 => trimmed.to_string(),
            n => return Err(invalid(format!("expected 5, 6 or 7 fields, got {n}"))),
        };
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            expr: trimmed.to_string(),
            schedule,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }
}

/// Work the scheduler fires.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn run(&self) -> Result<RunOutcome, RunError>;
}

#[async_trait]
impl ScheduledJob for Agent {
    async fn run(&self) -> Result<RunOutcome, RunError> {
        self.run_once().await
    }
}

#[derive(Debug)]
pub enum FireOutcome {
    Completed(Result<RunOutcome, RunError>),
    SkippedOverlap,
}

pub struct Scheduler {
    trigger: CronTrigger,
    job: Arc<dyn ScheduledJob>,
    running: AtomicBool,
}

/// Clears the in-flight flag even if the job panics.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    pub fn new(trigger: CronTrigger, job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            trigger,
            job,
            running: AtomicBool::new(false),
        }
    }

    pub fn trigger(&self) -> &CronTrigger {
        &self.trigger
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the job once now unless a run is already in flight.
    /// Errors are logged here and returned, never propagated further.
    pub async fn fire(&self) -> FireOutcome {
        ensure_metrics_described();
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(schedule = %self.trigger.expr(), "previous run still in flight, skipping");
            counter!("scheduled_runs_skipped_total").increment(1);
            return FireOutcome::SkippedOverlap;
        }
        let _guard = RunningGuard(&self.running);

        counter!("scheduled_runs_total").increment(1);
        tracing::info!(schedule = %self.trigger.expr(), "cron triggered, running agent");
        let result = self.job.run().await;
        match &result {
            Ok(RunOutcome::Published(post)) => {
                tracing::info!(urn = %post.urn, "scheduled run published a post")
            }
            Ok(RunOutcome::Skipped) => tracing::info!("scheduled run skipped: no news"),
            Err(e) => {
                counter!("scheduled_runs_failed_total").increment(1);
                tracing::error!(error = %e, "scheduled run failed; waiting for next firing");
            }
        }
        FireOutcome::Completed(result)
    }

    /// Spawn the timer loop. Each firing runs in its own task so a slow run
    /// cannot delay the clock; overlapping firings are skipped by `fire`.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let this = Arc::new(self);
        let task = tokio::spawn(async move {
            tracing::info!(schedule = %this.trigger.expr(), "scheduler started");
            loop {
                let now = Local::now();
                let Some(next) = this.trigger.next_after(&now) else {
                    tracing::warn!(schedule = %this.trigger.expr(), "schedule has no future firings");
                    break;
                };
                tracing::info!(next = %next.to_rfc3339(), "next run scheduled");
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = &mut stop_rx => break,
                }
                let s = Arc::clone(&this);
                tokio::spawn(async move {
                    s.fire().await;
                });
            }
            tracing::info!("scheduler stopped");
        });
        SchedulerHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Owned registration of a running schedule. Dropping it stops future
/// firings; a run already in flight finishes on its own.
pub struct SchedulerHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timer loop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// How a trigger session ended without error.
#[derive(Debug, PartialEq, Eq)]
pub enum TriggerExit {
    /// Immediate mode: the single run finished.
    Ran(RunOutcome),
    /// Scheduled mode: shutdown was requested and the scheduler stopped.
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Process exit status: 0 unless the session itself failed.
pub fn exit_status(result: &Result<TriggerExit, TriggerError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Run the job once now, or register `schedule` and keep firing until
/// `shutdown` resolves.
///
/// Immediate mode returns the run's error. Scheduled mode only fails on an
/// invalid expression, before anything is registered; errors inside
/// scheduled runs are logged by `fire` and never surface here.
pub async fn run_trigger<F>(
    run_now: bool,
    schedule: &str,
    job: Arc<dyn ScheduledJob>,
    shutdown: F,
) -> Result<TriggerExit, TriggerError>
where
    F: Future<Output = ()>,
{
    if run_now {
        tracing::info!("RUN_NOW set, running once");
        let outcome = job.run().await?;
        tracing::info!(?outcome, "run complete");
        return Ok(TriggerExit::Ran(outcome));
    }

    let trigger = CronTrigger::parse(schedule)?;
    let handle = Scheduler::new(trigger, job).start();
    shutdown.await;
    tracing::info!("shutting down");
    handle.stop().await;
    Ok(TriggerExit::Stopped)
}
