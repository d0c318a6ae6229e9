use serde::Deserialize;

use crate::model::{Build, BuildStatus};

/// Response of `GET /view/{view}/api/json`.
#[derive(Debug, Deserialize)]
pub struct ViewResponse {
    #[serde(default)]
    pub jobs: Vec<JenkinsJob>,
}

/// Response of `GET /job/{name}/api/json?tree=builds[...]`.
#[derive(Debug, Deserialize)]
pub struct JobBuildsResponse {
    #[serde(default)]
    pub builds: Vec<JenkinsBuild>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsJob {
    /// Folder-qualified job name, e.g. "team/generated-shop-app-deployment"
    pub full_name: String,
    /// Jobs triggered when this one completes
    #[serde(default)]
    pub downstream_projects: Vec<ProjectRef>,
    pub last_build: Option<JenkinsBuild>,
    pub last_completed_build: Option<JenkinsBuild>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsBuild {
    pub number: u64,
    /// Start time in milliseconds since the epoch
    pub timestamp: i64,
    /// Duration in milliseconds, 0 while building
    #[serde(default)]
    pub duration: i64,
    /// `None` while the build is in progress
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
}

pub fn parse_result(result: Option<&str>) -> BuildStatus {
    match result {
        None => BuildStatus::Started,
        Some("SUCCESS") => BuildStatus::Succeeded,
        Some("FAILURE") => BuildStatus::Failed,
        Some(other) => {
            log::debug!("Unknown Jenkins build result {other}");
            BuildStatus::Unknown
        }
    }
}

impl JenkinsBuild {
    pub fn is_running(&self) -> bool {
        self.building || self.result.is_none()
    }
}

impl From<JenkinsBuild> for Build {
    fn from(build: JenkinsBuild) -> Self {
        let id = Some(build.number.to_string());
        let start_time = build.timestamp / 1000;

        if build.is_running() {
            return Build::running(id, start_time);
        }

        Build::finished(
            id,
            parse_result(build.result.as_deref()),
            start_time,
            (build.timestamp + build.duration) / 1000,
        )
    }
}
