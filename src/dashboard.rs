use chrono::{DateTime, Datelike, Days, Local, NaiveTime, TimeZone, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::aggregate::{self, Bands};
use crate::error::Result;
use crate::history::{BuildHistoryCache, BuildHistoryRecord, HistoryStore};
use crate::model::{Build, BuildStatus, Job, Pipeline, Timestamp};
use crate::output::PhaseProgress;
use crate::providers::Backend;

/// Jobs whose recent build history is summarized next to the pipeline name.
#[derive(Debug, Clone)]
pub struct SummaryJobs {
    /// Periodic verification job, shown as a weekly success percentage
    pub health_check_job: String,
    /// Manual promotion job, shown as a weekly success count
    pub deploy_job: String,
}

impl Default for SummaryJobs {
    fn default() -> Self {
        Self {
            health_check_job: "health-check".to_string(),
            deploy_job: "manual-deploy-to-prod".to_string(),
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub backend: String,
    pub collected_at: DateTime<Utc>,
    /// Ranked most urgent first
    pub pipelines: Vec<Pipeline>,
    pub history: Vec<BuildHistoryRecord>,
}

impl Dashboard {
    pub fn bands(&self) -> Bands<'_> {
        aggregate::partition_bands(&self.pipelines)
    }

    pub fn history_for(&self, pipeline: &str, job: &str) -> Option<&BuildHistoryRecord> {
        self.history
            .iter()
            .find(|r| r.pipeline_name == pipeline && r.job_name == job)
    }

    /// Jobs whose finished build failed or errored.
    pub fn failures(&self) -> impl Iterator<Item = (&Pipeline, &Job, &Build)> {
        self.pipelines.iter().flat_map(|pipeline| {
            pipeline.jobs.iter().filter_map(move |job| {
                job.finished_build
                    .as_ref()
                    .filter(|b| b.status.is_failure())
                    .map(|build| (pipeline, job, build))
            })
        })
    }
}

/// Weekly success percentage of a health-check job, rounded down.
///
/// `None` when no build succeeded or failed since the cutoff.
pub fn health_check_percentage(record: &BuildHistoryRecord) -> Option<u32> {
    let succeeded = record.status_count(BuildStatus::Succeeded);
    let failed = record.status_count(BuildStatus::Failed);
    let total = succeeded + failed;
    if total == 0 {
        return None;
    }
    u32::try_from(100 * succeeded / total).ok()
}

/// Successful deployments since the cutoff.
pub fn deploy_count(record: &BuildHistoryRecord) -> usize {
    record.status_count(BuildStatus::Succeeded)
}

/// Local midnight at the start of the week (Sunday) containing `now`.
pub fn beginning_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> Timestamp {
    let days_back = u64::from(now.weekday().num_days_from_sunday());
    let date = now.date_naive() - Days::new(days_back);
    let midnight = date.and_time(NaiveTime::MIN);

    midnight
        .and_local_timezone(now.timezone())
        .earliest()
        .map_or_else(|| midnight.and_utc().timestamp(), |t| t.timestamp())
}

/// Runs one refresh cycle against a backend.
///
/// Pipelines are fetched, each one ordered and aggregated, then ranked. The
/// configured summary jobs of every pipeline get their weekly build history
/// from `cache`.
///
/// # Errors
///
/// Propagates fetch failures of the pipeline listing, and authentication
/// failures from any history fetch. Other history failures only drop that figure.
pub async fn refresh<S: HistoryStore>(
    backend: &Backend,
    cache: &mut BuildHistoryCache<S>,
    summary_jobs: &SummaryJobs,
    now: DateTime<Local>,
    show_progress: bool,
) -> Result<Dashboard> {
    info!("Refreshing {} pipelines", backend.label());

    let progress = PhaseProgress::start_phase_1(backend.label(), show_progress);
    let pipelines = backend.fetch_pipelines().await?;

    let progress = progress.finish_phase_1_start_phase_2(pipelines.len());
    let pipelines = aggregate::rank(pipelines.into_iter().map(Pipeline::settle).collect());

    let progress = progress.finish_phase_2_start_phase_3();
    let since = beginning_of_week(&now);
    let history = collect_history(backend, cache, summary_jobs, &pipelines, since).await?;
    progress.finish_phase_3(history.len());

    Ok(Dashboard {
        backend: backend.label().to_string(),
        collected_at: now.with_timezone(&Utc),
        pipelines,
        history,
    })
}

async fn collect_history<S: HistoryStore>(
    backend: &Backend,
    cache: &mut BuildHistoryCache<S>,
    summary_jobs: &SummaryJobs,
    pipelines: &[Pipeline],
    since: Timestamp,
) -> Result<Vec<BuildHistoryRecord>> {
    let mut records = Vec::new();
    let wanted = [&summary_jobs.health_check_job, &summary_jobs.deploy_job];

    for pipeline in pipelines {
        for job in wanted.iter().filter_map(|name| pipeline.job(name)) {
            let Some(build_id) = job.finished_build.as_ref().and_then(|b| b.id.as_deref()) else {
                continue;
            };

            let result = cache
                .get_history(&pipeline.name, &job.name, build_id, since, || {
                    backend.fetch_builds(&pipeline.name, job)
                })
                .await;

            match result {
                Ok(record) => records.push(record),
                Err(e) if e.requires_login() => return Err(e),
                Err(e) => warn!(
                    "Failed to fetch build history for {}:{}: {e}",
                    pipeline.name, job.name
                ),
            }
        }
    }

    Ok(records)
}
