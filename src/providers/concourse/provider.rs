use log::{debug, info};

use crate::auth::Credentials;
use crate::error::{RadiatorError, Result};
use crate::model::{Build, Job, Pipeline};

use super::client::ConcourseClient;
use super::types::ConcourseJob;

/// Adapter for Concourse, where dependencies are the `passed` constraints on job inputs.
pub struct ConcourseProvider {
    pub client: ConcourseClient,
}

impl ConcourseProvider {
    /// Creates a provider for one team, logging in first when basic credentials are given.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the login is rejected.
    pub async fn connect(base_url: &str, team: &str, credentials: Credentials) -> Result<Self> {
        let mut client = ConcourseClient::new(base_url, team, credentials)?;
        client.login().await?;
        Ok(Self { client })
    }

    /// Fetches every unpaused pipeline with its jobs.
    ///
    /// Job lists are requested concurrently and nothing is returned until all of
    /// them arrived. Jobs are left unordered and aggregates empty.
    ///
    /// # Errors
    ///
    /// - [`RadiatorError::NoJobsFound`] when the team has no pipelines or its
    ///   active pipelines have no jobs
    /// - [`RadiatorError::Authentication`] when any request is rejected
    /// - any other request failure, which discards the whole cycle
    pub async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>> {
        let listed = self.client.fetch_pipelines().await?;
        if listed.is_empty() {
            return Err(RadiatorError::NoJobsFound);
        }

        let active: Vec<_> = listed.into_iter().filter(|p| !p.paused).collect();
        info!("Fetching jobs for {} active pipelines...", active.len());
        if active.is_empty() {
            return Ok(vec![]);
        }

        let futures: Vec<_> = active
            .iter()
            .map(|pipeline| self.client.fetch_jobs(&pipeline.name))
            .collect();
        let results = futures::future::join_all(futures).await;

        let job_lists = collect_all(results)?;
        if job_lists.iter().all(Vec::is_empty) {
            return Err(RadiatorError::NoJobsFound);
        }

        Ok(active
            .into_iter()
            .zip(job_lists)
            .map(|(pipeline, jobs)| pipeline_from_jobs(pipeline.name, jobs))
            .collect())
    }

    pub async fn fetch_builds(&self, pipeline: &str, job: &Job) -> Result<Vec<Build>> {
        let builds = self.client.fetch_builds(pipeline, &job.source_name).await?;
        Ok(builds.into_iter().map(Build::from).collect())
    }
}

/// Unwraps fan-in results, preferring an authentication failure over any other error.
fn collect_all<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut first_error = None;

    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) if e.requires_login() => return Err(e),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

pub(crate) fn pipeline_from_jobs(name: String, jobs: Vec<ConcourseJob>) -> Pipeline {
    debug!("Examining {} jobs in {}", jobs.len(), name);
    Pipeline::new(name, jobs.into_iter().map(canonical_job).collect())
}

/// Dependencies are the union of `passed` names over all inputs.
fn canonical_job(job: ConcourseJob) -> Job {
    let dependencies: Vec<String> = job
        .inputs
        .into_iter()
        .flat_map(|input| input.passed)
        .collect();

    Job::new(job.name)
        .depends_on(dependencies)
        .with_finished_build(job.finished_build.map(Build::from))
        .with_running_build(job.next_build.map(Build::from))
}
