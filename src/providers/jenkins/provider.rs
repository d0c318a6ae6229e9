use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::auth::Credentials;
use crate::error::{RadiatorError, Result};
use crate::model::{Build, Job, Pipeline};

use super::client::JenkinsClient;
use super::job_name::JobName;
use super::types::JenkinsJob;

/// Adapter for Jenkins views, where edges point downstream and pipelines are
/// recovered from generated job names.
pub struct JenkinsProvider {
    pub client: JenkinsClient,
}

impl JenkinsProvider {
    pub fn new(base_url: &str, view: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: JenkinsClient::new(base_url, view, credentials)?,
        })
    }

    /// Fetches the view and regroups its jobs into pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`RadiatorError::NoJobsFound`] when the view lists no jobs, and
    /// propagates request failures.
    pub async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>> {
        let jobs = self.client.fetch_view_jobs().await?;
        info!("Fetched {} Jenkins jobs", jobs.len());
        pipelines_from_jobs(jobs)
    }

    pub async fn fetch_builds(&self, _pipeline: &str, job: &Job) -> Result<Vec<Build>> {
        let builds = self.client.fetch_builds(&job.source_name).await?;
        Ok(builds.into_iter().map(Build::from).collect())
    }
}

/// Groups raw jobs into pipelines in first-seen order.
///
/// A job lists B as a dependency when B names it among its downstream
/// projects. Downstream links that leave the pipeline are dropped.
pub(crate) fn pipelines_from_jobs(jobs: Vec<JenkinsJob>) -> Result<Vec<Pipeline>> {
    if jobs.is_empty() {
        return Err(RadiatorError::NoJobsFound);
    }

    // Keyed by kind too, so a plain job never joins a generated group of the same name.
    let mut groups: IndexMap<(bool, String), Vec<(JobName, JenkinsJob)>> = IndexMap::new();
    for job in jobs {
        let name = JobName::parse(&job.full_name);
        if let JobName::Unrecognized(full_name) = &name {
            warn!("Job name doesn't match the generated pattern: {full_name}");
        }
        groups
            .entry((name.is_generated(), name.pipeline_name()))
            .or_default()
            .push((name, job));
    }

    Ok(groups
        .into_iter()
        .map(|((_, pipeline_name), members)| pipeline_from_group(pipeline_name, members))
        .collect())
}

fn pipeline_from_group(pipeline_name: String, members: Vec<(JobName, JenkinsJob)>) -> Pipeline {
    debug!("Examining {} jobs in {}", members.len(), pipeline_name);

    let display_names: HashMap<&str, String> = members
        .iter()
        .map(|(name, job)| (job.full_name.as_str(), name.display_name()))
        .collect();

    let mut upstream: HashMap<&str, Vec<String>> = HashMap::new();
    for (name, job) in &members {
        for downstream in &job.downstream_projects {
            if display_names.contains_key(downstream.full_name.as_str()) {
                upstream
                    .entry(downstream.full_name.as_str())
                    .or_default()
                    .push(name.display_name());
            }
        }
    }

    let jobs = members
        .iter()
        .map(|(name, job)| {
            let dependencies = upstream
                .get(job.full_name.as_str())
                .cloned()
                .unwrap_or_default();
            canonical_job(name, job, dependencies)
        })
        .collect();

    Pipeline::new(pipeline_name, jobs)
}

/// A building `lastBuild` is the running build; the finished build is the last completed one.
fn canonical_job(name: &JobName, job: &JenkinsJob, dependencies: Vec<String>) -> Job {
    let running_build = job
        .last_build
        .as_ref()
        .filter(|b| b.is_running())
        .cloned()
        .map(Build::from);

    let finished_build = job
        .last_completed_build
        .clone()
        .or_else(|| job.last_build.clone().filter(|b| !b.is_running()))
        .map(Build::from);

    Job::new(name.display_name())
        .with_source_name(job.full_name.clone())
        .depends_on(dependencies)
        .with_finished_build(finished_build)
        .with_running_build(running_build)
}
