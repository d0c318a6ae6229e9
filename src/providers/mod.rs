mod concourse;
mod http;
mod jenkins;

pub use concourse::ConcourseProvider;
pub use jenkins::JenkinsProvider;

use crate::error::Result;
use crate::model::{Build, Job, Pipeline};
use url::Url;

/// The CI server a dashboard reads from.
///
/// Both variants hand back canonical pipelines whose dependency names point
/// upstream, so nothing past this point knows which backend produced them.
pub enum Backend {
    Concourse(ConcourseProvider),
    Jenkins(JenkinsProvider),
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Concourse(_) => "Concourse",
            Self::Jenkins(_) => "Jenkins",
        }
    }

    /// Identifies the server for cache file naming, e.g. `concourse-ci.example.com`.
    pub fn slug(&self) -> String {
        let base_url = match self {
            Self::Concourse(provider) => provider.client.base_url(),
            Self::Jenkins(provider) => provider.client.base_url(),
        };
        slug_for(self.label(), base_url)
    }

    /// Current pipelines with unordered jobs and empty aggregates.
    pub async fn fetch_pipelines(&self) -> Result<Vec<Pipeline>> {
        match self {
            Self::Concourse(provider) => provider.fetch_pipelines().await,
            Self::Jenkins(provider) => provider.fetch_pipelines().await,
        }
    }

    /// A job's build list, newest first.
    pub async fn fetch_builds(&self, pipeline: &str, job: &Job) -> Result<Vec<Build>> {
        match self {
            Self::Concourse(provider) => provider.fetch_builds(pipeline, job).await,
            Self::Jenkins(provider) => provider.fetch_builds(pipeline, job).await,
        }
    }
}

/// Cache slug for a backend that has not been connected, used by `clear-cache`.
///
/// # Errors
///
/// Returns [`RadiatorError::Config`](crate::error::RadiatorError::Config) for an invalid URL.
pub fn cache_slug(label: &str, base_url: &str) -> Result<String> {
    Ok(slug_for(label, &http::parse_base_url(base_url)?))
}

fn slug_for(label: &str, base_url: &Url) -> String {
    let host = base_url.host_str().unwrap_or("local");
    match base_url.port() {
        Some(port) => format!("{}-{host}-{port}", label.to_lowercase()),
        None => format!("{}-{host}", label.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    #[test]
    fn slug_names_backend_and_host() {
        let backend = Backend::Jenkins(
            JenkinsProvider::new("https://jenkins.example.com", "CD", Credentials::Anonymous)
                .unwrap(),
        );
        assert_eq!(backend.label(), "Jenkins");
        assert_eq!(backend.slug(), "jenkins-jenkins.example.com");
    }

    #[test]
    fn slug_keeps_explicit_port() {
        let backend = Backend::Jenkins(
            JenkinsProvider::new("http://127.0.0.1:8080", "CD", Credentials::Anonymous).unwrap(),
        );
        assert_eq!(backend.slug(), "jenkins-127.0.0.1-8080");
    }

    #[test]
    fn cache_slug_matches_connected_backend() {
        assert_eq!(
            cache_slug("Concourse", "https://ci.example.com/").unwrap(),
            "concourse-ci.example.com"
        );
        assert!(cache_slug("Concourse", "not a url").is_err());
    }
}
