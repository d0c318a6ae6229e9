mod client;
mod job_name;
mod provider;
mod types;

pub use provider::JenkinsProvider;
