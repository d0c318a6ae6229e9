use std::cmp::Ordering;

use crate::model::{Aggregates, BuildStatus, Job, Pipeline};

/// Scans every job once and collects the pipeline's health signals.
///
/// Failure and success times come from the end of the finished build, the
/// running time from the start of the running build. Missing values stay 0.
pub fn aggregate(jobs: &[Job]) -> Aggregates {
    let mut aggregates = Aggregates::default();

    for job in jobs {
        if let Some(build) = &job.finished_build {
            let end_time = build.end_time.unwrap_or(0);
            if build.status.is_failure() {
                aggregates.latest_failure_time = aggregates.latest_failure_time.max(end_time);
            } else if build.status == BuildStatus::Succeeded {
                aggregates.latest_success_time = aggregates.latest_success_time.max(end_time);
                if let Some(end_time) = build.end_time {
                    aggregates
                        .per_job_latest_success_time
                        .insert(job.name.clone(), end_time);
                }
            }
        }

        if let Some(start_time) = job.running_build.as_ref().and_then(|b| b.start_time) {
            aggregates.latest_running_time = aggregates.latest_running_time.max(start_time);
        }
    }

    aggregates
}

/// Most recently failed first, then most recently started, then most recently succeeded.
pub fn compare_health(a: &Aggregates, b: &Aggregates) -> Ordering {
    b.latest_failure_time
        .cmp(&a.latest_failure_time)
        .then_with(|| b.latest_running_time.cmp(&a.latest_running_time))
        .then_with(|| b.latest_success_time.cmp(&a.latest_success_time))
}

/// Sorts pipelines by [`compare_health`]. Full ties keep their input order.
pub fn rank(mut pipelines: Vec<Pipeline>) -> Vec<Pipeline> {
    pipelines.sort_by(|a, b| compare_health(&a.aggregates, &b.aggregates));
    pipelines
}

/// The three display groups of a ranked pipeline sequence.
#[derive(Debug)]
pub struct Bands<'a> {
    pub failing: &'a [Pipeline],
    pub running: &'a [Pipeline],
    pub succeeding: &'a [Pipeline],
}

/// Splits a ranked sequence at the first pipeline without failures and then
/// at the first remaining pipeline without a running build.
pub fn partition_bands(ranked: &[Pipeline]) -> Bands<'_> {
    let failing_end = ranked
        .iter()
        .position(|p| p.aggregates.latest_failure_time == 0)
        .unwrap_or(ranked.len());
    let (failing, rest) = ranked.split_at(failing_end);

    let running_end = rest
        .iter()
        .position(|p| p.aggregates.latest_running_time == 0)
        .unwrap_or(rest.len());
    let (running, succeeding) = rest.split_at(running_end);

    Bands {
        failing,
        running,
        succeeding,
    }
}
