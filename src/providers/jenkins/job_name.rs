use std::sync::LazyLock;

use regex::Regex;

static GENERATED_JOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(.+)/)?generated-(.+)-(staging|prod[-a-z]*|app|journey)-(image-build|deployment|journey-test)$",
    )
    .expect("job name pattern is valid")
});

/// Parts of a generated Jenkins job full name,
/// e.g. `team/generated-shop-prod-eu-deployment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobName {
    Generated {
        folder: Option<String>,
        name: String,
        environment: String,
        stage: String,
    },
    /// Full name that does not follow the generated pattern
    Unrecognized(String),
}

impl JobName {
    pub fn parse(full_name: &str) -> Self {
        match GENERATED_JOB.captures(full_name) {
            Some(caps) => Self::Generated {
                folder: caps.get(1).map(|m| m.as_str().to_owned()),
                name: caps[2].to_owned(),
                environment: caps[3].to_owned(),
                stage: caps[4].to_owned(),
            },
            None => Self::Unrecognized(full_name.to_owned()),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }

    /// Name of the pipeline this job belongs to.
    pub fn pipeline_name(&self) -> String {
        match self {
            Self::Generated {
                folder: Some(folder),
                name,
                ..
            } => format!("{folder}/{name}"),
            Self::Generated { name, .. } => name.clone(),
            Self::Unrecognized(full_name) => full_name.clone(),
        }
    }

    /// Name of the job as shown inside its pipeline.
    pub fn display_name(&self) -> String {
        match self {
            Self::Generated {
                environment, stage, ..
            } => format!("{environment} {stage}"),
            Self::Unrecognized(full_name) => full_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_folder_name_environment_and_stage() {
        let parsed = JobName::parse("payments/generated-ledger-staging-deployment");
        assert_eq!(
            parsed,
            JobName::Generated {
                folder: Some("payments".into()),
                name: "ledger".into(),
                environment: "staging".into(),
                stage: "deployment".into(),
            }
        );
        assert_eq!(parsed.pipeline_name(), "payments/ledger");
        assert_eq!(parsed.display_name(), "staging deployment");
    }

    #[test]
    fn parses_without_folder() {
        let parsed = JobName::parse("generated-shop-app-image-build");
        assert_eq!(parsed.pipeline_name(), "shop");
        assert_eq!(parsed.display_name(), "app image-build");
    }

    #[test]
    fn prod_variants_belong_to_the_environment() {
        let parsed = JobName::parse("generated-shop-prod-eu-deployment");
        assert_eq!(parsed.pipeline_name(), "shop");
        assert_eq!(parsed.display_name(), "prod-eu deployment");
    }

    #[test]
    fn hyphenated_names_are_kept_whole() {
        let parsed = JobName::parse("generated-order-api-journey-journey-test");
        assert_eq!(parsed.pipeline_name(), "order-api");
        assert_eq!(parsed.display_name(), "journey journey-test");
    }

    #[test]
    fn unknown_stage_falls_back_to_full_name() {
        let parsed = JobName::parse("generated-shop-staging-smoke");
        assert_eq!(parsed, JobName::Unrecognized("generated-shop-staging-smoke".into()));
        assert_eq!(parsed.pipeline_name(), "generated-shop-staging-smoke");
        assert_eq!(parsed.display_name(), "generated-shop-staging-smoke");
    }

    #[test]
    fn unrelated_job_falls_back_to_full_name() {
        let parsed = JobName::parse("tools/nightly-backup");
        assert!(!parsed.is_generated());
        assert_eq!(parsed.pipeline_name(), "tools/nightly-backup");
        assert!(JobName::parse("generated-shop-app-deployment").is_generated());
    }
}
