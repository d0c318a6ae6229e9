use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::aggregate;
use crate::ordering;

/// Seconds since the Unix epoch. Zero means "never".
pub type Timestamp = i64;

/// Outcome of a single build, shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Started,
    Succeeded,
    Failed,
    Errored,
    Unknown,
}

impl BuildStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Errored)
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Backend build identifier (Concourse build name, Jenkins build number)
    pub id: Option<String>,
    pub status: BuildStatus,
    pub start_time: Option<Timestamp>,
    /// Set once the build stopped. Unknown builds (aborted, unstable) keep the
    /// backend's end time even though they are not terminal.
    pub end_time: Option<Timestamp>,
}

impl Build {
    pub fn running(id: Option<String>, start_time: Timestamp) -> Self {
        Self {
            id,
            status: BuildStatus::Started,
            start_time: Some(start_time),
            end_time: None,
        }
    }

    pub fn finished(
        id: Option<String>,
        status: BuildStatus,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            id,
            status,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }
}

/// A named unit of work within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Display name, unique within its pipeline
    pub name: String,
    /// Identifier the backend knows this job by, used to fetch its build list
    pub source_name: String,
    /// Jobs that must succeed before this one may run
    pub dependency_names: IndexSet<String>,
    /// Most recent terminal build
    pub finished_build: Option<Build>,
    /// Build currently in progress
    pub running_build: Option<Build>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_name: name.clone(),
            name,
            dependency_names: IndexSet::new(),
            finished_build: None,
            running_build: None,
        }
    }

    #[must_use]
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_finished_build(mut self, build: impl Into<Option<Build>>) -> Self {
        self.finished_build = build.into();
        self
    }

    #[must_use]
    pub fn with_running_build(mut self, build: impl Into<Option<Build>>) -> Self {
        self.running_build = build.into();
        self
    }
}

/// Per-pipeline health signals derived from its jobs' builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub latest_failure_time: Timestamp,
    pub latest_running_time: Timestamp,
    pub latest_success_time: Timestamp,
    pub per_job_latest_success_time: IndexMap<String, Timestamp>,
}

/// A named group of jobs, rebuilt from scratch on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub jobs: Vec<Job>,
    pub aggregates: Aggregates,
}

impl Pipeline {
    /// Pipeline as an adapter produces it: jobs unordered, aggregates empty.
    pub fn new(name: impl Into<String>, jobs: Vec<Job>) -> Self {
        Self {
            name: name.into(),
            jobs,
            aggregates: Aggregates::default(),
        }
    }

    /// Orders the jobs by dependency and computes the aggregates.
    #[must_use]
    pub fn settle(self) -> Self {
        let order = ordering::order_jobs(self.jobs);
        if !order.unresolved.is_empty() {
            log::warn!(
                "Pipeline {} has a dependency cycle; order will be off near: {}",
                self.name,
                order.unresolved.join(", ")
            );
        }

        let aggregates = aggregate::aggregate(&order.jobs);

        Self {
            name: self.name,
            jobs: order.jobs,
            aggregates,
        }
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }
}
