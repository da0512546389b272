// tests/trigger_modes.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use linkedin_news_agent::publish::PublishError;
use linkedin_news_agent::scheduler::{exit_status, run_trigger, ScheduledJob};
use linkedin_news_agent::{RunError, RunOutcome, TriggerError, TriggerExit};

#[derive(Default)]
struct Job {
    calls: AtomicUsize,
    fail: bool,
}

impl Job {
    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduledJob for Job {
    async fn run(&self) -> Result<RunOutcome, RunError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RunError::Publish(PublishError::MissingCredential(
                "LINKEDIN_ACCESS_TOKEN",
            )))
        } else {
            Ok(RunOutcome::Skipped)
        }
    }
}

#[tokio::test]
async fn run_now_failure_exits_non_zero() {
    let job = Job::failing();
    let result = run_trigger(true, "0 9 * * *", job.clone(), std::future::pending()).await;

    assert!(matches!(
        result,
        Err(TriggerError::Run(RunError::Publish(PublishError::MissingCredential(_))))
    ));
    assert_eq!(exit_status(&result), 1);
    assert_eq!(job.calls(), 1);
}

#[tokio::test]
async fn run_now_success_exits_zero() {
    let job = Arc::new(Job::default());
    let result = run_trigger(true, "0 9 * * *", job.clone(), std::future::pending()).await;

    assert_eq!(result.as_ref().unwrap(), &TriggerExit::Ran(RunOutcome::Skipped));
    assert_eq!(exit_status(&result), 0);
}

#[tokio::test]
async fn run_now_ignores_the_schedule() {
    let job = Arc::new(Job::default());
    let result = run_trigger(true, "not a cron", job.clone(), std::future::pending()).await;
    assert_eq!(exit_status(&result), 0);
    assert_eq!(job.calls(), 1);
}

#[tokio::test]
async fn invalid_schedule_fails_before_registering() {
    let job = Job::failing();
    let result = tokio::time::timeout(
        Duration::from_secs(1),
        run_trigger(false, "0 9 * * 8", job.clone(), std::future::pending()),
    )
    .await
    .expect("invalid schedule must return at once");

    assert!(matches!(result, Err(TriggerError::Schedule(_))));
    assert_eq!(exit_status(&result), 1);
    assert_eq!(job.calls(), 0, "nothing may run");
}

#[tokio::test]
async fn scheduled_mode_swallows_run_failures() {
    let job = Job::failing();
    let shutdown = tokio::time::sleep(Duration::from_millis(2_500));
    let result = run_trigger(false, "* * * * * *", job.clone(), shutdown).await;

    assert_eq!(result.as_ref().unwrap(), &TriggerExit::Stopped);
    assert_eq!(exit_status(&result), 0);
    assert!(job.calls() >= 1, "scheduled runs should have fired");
}
