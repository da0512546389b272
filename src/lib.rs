// src/lib.rs
// Public library surface for both binaries and the integration tests.

pub mod agent;
pub mod auth;
pub mod config;
pub mod generate;
pub mod ingest;
pub mod metrics;
pub mod publish;
pub mod scheduler;

pub use crate::agent::{Agent, RunError, RunOutcome};
pub use crate::config::AgentConfig;
pub use crate::scheduler::{
    CronTrigger, FireOutcome, ScheduleError, Scheduler, SchedulerHandle, TriggerError, TriggerExit,
};
