use serde::Deserialize;

use crate::model::{Build, BuildStatus, Timestamp};

/// Entry of `GET /api/v1/teams/{team}/pipelines`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConcoursePipeline {
    pub name: String,
    #[serde(default)]
    pub paused: bool,
}

/// Entry of `GET /api/v1/teams/{team}/pipelines/{pipeline}/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConcourseJob {
    pub name: String,
    /// Most recent build that reached a final status
    pub finished_build: Option<ConcourseBuild>,
    /// Build currently pending or running
    pub next_build: Option<ConcourseBuild>,
    #[serde(default)]
    pub inputs: Vec<ConcourseInput>,
}

/// A job input. `passed` names the upstream jobs a version must have gone through.
#[derive(Debug, Clone, Deserialize)]
pub struct ConcourseInput {
    #[serde(default)]
    pub passed: Vec<String>,
}

/// Build as returned inside jobs and by the job builds endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConcourseBuild {
    /// Per-job build number, e.g. "42"
    pub name: String,
    pub status: String,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

/// Response of `GET /api/v1/teams/{team}/auth/token`.
#[derive(Debug, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "type")]
    pub token_type: String,
    pub value: String,
}

pub fn parse_status(status: &str) -> BuildStatus {
    match status {
        "pending" | "started" => BuildStatus::Started,
        "succeeded" => BuildStatus::Succeeded,
        "failed" => BuildStatus::Failed,
        "errored" => BuildStatus::Errored,
        _ => BuildStatus::Unknown,
    }
}

impl From<ConcourseBuild> for Build {
    fn from(build: ConcourseBuild) -> Self {
        Build {
            id: Some(build.name),
            status: parse_status(&build.status),
            start_time: build.start_time,
            end_time: build.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_concourse_statuses() {
        assert_eq!(parse_status("pending"), BuildStatus::Started);
        assert_eq!(parse_status("started"), BuildStatus::Started);
        assert_eq!(parse_status("succeeded"), BuildStatus::Succeeded);
        assert_eq!(parse_status("failed"), BuildStatus::Failed);
        assert_eq!(parse_status("errored"), BuildStatus::Errored);
        assert_eq!(parse_status("aborted"), BuildStatus::Unknown);
    }

    #[test]
    fn decodes_job_without_inputs() {
        let job: ConcourseJob = serde_json::from_str(
            r#"{"name":"unit","finished_build":{"id":7,"name":"12","status":"failed","start_time":10,"end_time":20}}"#,
        )
        .unwrap();
        assert!(job.inputs.is_empty());
        assert!(job.next_build.is_none());

        let build = Build::from(job.finished_build.unwrap());
        assert_eq!(build.id.as_deref(), Some("12"));
        assert_eq!(build.status, BuildStatus::Failed);
        assert_eq!(build.end_time, Some(20));
    }
}
