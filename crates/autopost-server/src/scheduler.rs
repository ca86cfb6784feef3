//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the four
//! recurring sweep jobs. Deployments that drive the sweeps from an external
//! scheduler hit the cron HTTP endpoints instead; both paths invoke the same
//! pipeline functions, so running both is harmless — the conditional writes
//! make every transition race-safe.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use autopost_ai::AiClient;
use autopost_linkedin::LinkedinClient;
use autopost_pipeline::{
    run_cutoff_sweep, run_generate_sweep, run_publish_sweep, run_schedule_sweep, GenerateContext,
    PublishContext, SweepOutcome,
};

/// Shared dependencies handed to every registered job.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub pool: PgPool,
    pub ai: Arc<AiClient>,
    pub linkedin: Arc<LinkedinClient>,
    pub http: reqwest::Client,
    pub default_provider: Arc<str>,
    pub default_model: Arc<str>,
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(deps: SchedulerDeps) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_schedule_job(&scheduler, deps.clone()).await?;
    register_generate_job(&scheduler, deps.clone()).await?;
    register_cutoff_job(&scheduler, deps.clone()).await?;
    register_publish_job(&scheduler, deps).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

fn cron_from_env(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn log_outcome(sweep: &'static str, outcome: &SweepOutcome) {
    let errors = outcome
        .results
        .iter()
        .filter(|r| r.status == "error" || r.status == "failed")
        .count();
    tracing::info!(sweep, processed = outcome.processed, errors, "sweep complete");
}

/// Daily placeholder materialization (`0 0 5 * * *` by default, overridable
/// with `AUTOPOST_SCHEDULE_SWEEP_CRON`).
async fn register_schedule_job(
    scheduler: &JobScheduler,
    deps: SchedulerDeps,
) -> Result<(), JobSchedulerError> {
    let cron = cron_from_env("AUTOPOST_SCHEDULE_SWEEP_CRON", "0 0 5 * * *");

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            match run_schedule_sweep(&deps.pool, Utc::now()).await {
                Ok(outcome) => log_outcome("schedule", &outcome),
                Err(e) => tracing::error!(error = %e, "scheduler: schedule sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered schedule sweep");
    Ok(())
}

/// Hourly draft generation (`0 0 * * * *` by default, overridable with
/// `AUTOPOST_GENERATE_SWEEP_CRON`). The 28-hour eligibility window gives
/// every post many chances even when ticks are missed.
async fn register_generate_job(
    scheduler: &JobScheduler,
    deps: SchedulerDeps,
) -> Result<(), JobSchedulerError> {
    let cron = cron_from_env("AUTOPOST_GENERATE_SWEEP_CRON", "0 0 * * * *");

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            let ctx = GenerateContext {
                pool: &deps.pool,
                ai: &deps.ai,
                default_provider: &deps.default_provider,
                default_model: &deps.default_model,
            };
            match run_generate_sweep(&ctx, Utc::now()).await {
                Ok(outcome) => log_outcome("generate", &outcome),
                Err(e) => tracing::error!(error = %e, "scheduler: generate sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered generate sweep");
    Ok(())
}

/// Review cutoff every five minutes (`0 */5 * * * *` by default,
/// overridable with `AUTOPOST_CUTOFF_SWEEP_CRON`).
async fn register_cutoff_job(
    scheduler: &JobScheduler,
    deps: SchedulerDeps,
) -> Result<(), JobSchedulerError> {
    let cron = cron_from_env("AUTOPOST_CUTOFF_SWEEP_CRON", "0 */5 * * * *");

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            match run_cutoff_sweep(&deps.pool, Utc::now()).await {
                Ok(outcome) => log_outcome("cutoff", &outcome),
                Err(e) => tracing::error!(error = %e, "scheduler: cutoff sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered cutoff sweep");
    Ok(())
}

/// Publication every two minutes (`0 */2 * * * *` by default, overridable
/// with `AUTOPOST_PUBLISH_SWEEP_CRON`).
async fn register_publish_job(
    scheduler: &JobScheduler,
    deps: SchedulerDeps,
) -> Result<(), JobSchedulerError> {
    let cron = cron_from_env("AUTOPOST_PUBLISH_SWEEP_CRON", "0 */2 * * * *");

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            let ctx = PublishContext {
                pool: &deps.pool,
                linkedin: &deps.linkedin,
                http: &deps.http,
            };
            match run_publish_sweep(&ctx, Utc::now()).await {
                Ok(outcome) => log_outcome("publish", &outcome),
                Err(e) => tracing::error!(error = %e, "scheduler: publish sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered publish sweep");
    Ok(())
}
