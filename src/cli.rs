use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use crate::auth::Credentials;
use crate::config::{Config, OutputFormat};
use crate::dashboard::{self, Dashboard, SummaryJobs};
use crate::error::RadiatorError;
use crate::history::{BuildHistoryCache, FileStore, HistoryStore, MemoryStore};
use crate::notify::Notifier;
use crate::output;
use crate::providers::{self, Backend, ConcourseProvider, JenkinsProvider};

#[derive(Parser)]
#[command(name = "ciradiator")]
#[command(author, version, about = "CI pipeline radiator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file, defaults to ./ciradiator.{toml,json,yaml,yml}
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Refresh every SECS seconds until interrupted
    #[arg(short, long, global = true, value_name = "SECS")]
    watch: Option<u64>,

    /// Keep build history in memory only
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the pipelines of a Concourse team
    Concourse {
        #[arg(short, long)]
        url: Option<String>,

        #[arg(long)]
        team: Option<String>,

        #[arg(short, long, env = "CONCOURSE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(short = 'U', long)]
        username: Option<String>,

        #[arg(long, env = "CONCOURSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show the pipelines generated into a Jenkins view
    Jenkins {
        #[arg(short, long)]
        url: Option<String>,

        #[arg(long)]
        view: Option<String>,

        #[arg(short = 'U', long)]
        username: Option<String>,

        #[arg(short, long, env = "JENKINS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Remove the persisted build history of a backend
    ClearCache {
        #[arg(value_enum)]
        backend: BackendKind,

        #[arg(short, long)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendKind {
    Concourse,
    Jenkins,
}

impl BackendKind {
    fn label(self) -> &'static str {
        match self {
            Self::Concourse => "Concourse",
            Self::Jenkins => "Jenkins",
        }
    }
}

/// Turns the conditions that need fresh credentials into a prompt for the user.
fn login_hint(error: RadiatorError) -> anyhow::Error {
    if error.requires_login() {
        let reason = error.to_string();
        anyhow!("{}. Please log in again.", reason.trim_end_matches('.'))
    } else {
        error.into()
    }
}

fn required_url(
    flag: Option<&String>,
    configured: Option<&String>,
    section: &str,
) -> Result<String> {
    flag.or(configured)
        .cloned()
        .with_context(|| format!("No {section} URL given: pass --url or set [{section}] base-url"))
}

async fn connect_concourse(
    config: &Config,
    url: Option<&String>,
    team: Option<&String>,
    credentials: Credentials,
) -> Result<Backend> {
    let url = required_url(url, config.concourse.base_url.as_ref(), "concourse")?;
    let team = team.unwrap_or(&config.concourse.team);
    info!("Connecting to Concourse team {team} at {url}");

    let provider = ConcourseProvider::connect(&url, team, credentials)
        .await
        .map_err(login_hint)?;
    Ok(Backend::Concourse(provider))
}

fn connect_jenkins(
    config: &Config,
    url: Option<&String>,
    view: Option<&String>,
    credentials: Credentials,
) -> Result<Backend> {
    let url = required_url(url, config.jenkins.base_url.as_ref(), "jenkins")?;
    let view = view.unwrap_or(&config.jenkins.view);
    info!("Reading Jenkins view {view} at {url}");

    Ok(Backend::Jenkins(JenkinsProvider::new(&url, view, credentials)?))
}

impl Cli {
    fn open_cache(
        &self,
        config: &Config,
        backend: &Backend,
    ) -> BuildHistoryCache<Box<dyn HistoryStore>> {
        let store: Box<dyn HistoryStore> = if self.no_cache || !config.cache.enabled {
            Box::new(MemoryStore::default())
        } else {
            match FileStore::open(&backend.slug()) {
                Ok(store) => {
                    info!("Using build history cache: {}", store.path().display());
                    Box::new(store)
                }
                Err(e) => {
                    warn!("Build history will not persist: {e}");
                    Box::new(MemoryStore::default())
                }
            }
        };

        BuildHistoryCache::new(store)
    }

    fn render(
        &self,
        dashboard: &Dashboard,
        config: &Config,
        summary_jobs: &SummaryJobs,
        notifier: &mut Notifier,
    ) -> Result<()> {
        let now = Local::now().timestamp();
        output::announce_failures(dashboard, notifier, now);

        match self.format.unwrap_or(config.output.format) {
            OutputFormat::Summary => {
                self.clear_view(std::io::stdout().is_terminal())?;
                output::print_summary(dashboard, summary_jobs, now);
                Ok(())
            }
            OutputFormat::Json => {
                let pretty = self.pretty || config.output.pretty;
                output::write_json(dashboard, pretty, self.output.as_deref())
            }
        }
    }

    /// Wipes the previous watch frame. Returns whether the screen was cleared.
    fn clear_view(&self, stdout_is_terminal: bool) -> Result<bool> {
        if self.watch.is_none() || !stdout_is_terminal {
            return Ok(false);
        }
        console::Term::stdout().clear_screen()?;
        Ok(true)
    }

    async fn run(&self, backend: Backend, config: &Config) -> Result<()> {
        let summary_jobs = config.dashboard.summary_jobs();
        let mut cache = self.open_cache(config, &backend);
        let interval = config.dashboard.notify_interval_secs;
        let mut notifier = if std::io::stderr().is_terminal() {
            Notifier::new(interval)
        } else {
            Notifier::silent(interval)
        };
        let show_progress = std::io::stderr().is_terminal();

        let Some(secs) = self.watch else {
            let dashboard =
                dashboard::refresh(&backend, &mut cache, &summary_jobs, Local::now(), show_progress)
                    .await
                    .map_err(login_hint)?;
            return self.render(&dashboard, config, &summary_jobs, &mut notifier);
        };

        let period = Duration::from_secs(secs.max(1));
        info!("Refreshing every {}s", period.as_secs());

        loop {
            match dashboard::refresh(&backend, &mut cache, &summary_jobs, Local::now(), show_progress)
                .await
            {
                Ok(dashboard) => self.render(&dashboard, config, &summary_jobs, &mut notifier)?,
                Err(e) if e.requires_login() => {
                    self.clear_view(std::io::stdout().is_terminal())?;
                    return Err(login_hint(e));
                }
                Err(e) => warn!("Refresh failed, keeping the previous view: {e}"),
            }
            tokio::time::sleep(period).await;
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Concourse {
                url,
                team,
                token,
                username,
                password,
            } => {
                let credentials = Credentials::from_parts(
                    token.as_ref().or(config.concourse.token.as_ref()).map(String::as_str),
                    username.as_ref().or(config.concourse.username.as_ref()).map(String::as_str),
                    password.as_ref().or(config.concourse.password.as_ref()).map(String::as_str),
                );
                let backend =
                    connect_concourse(&config, url.as_ref(), team.as_ref(), credentials).await?;
                self.run(backend, &config).await
            }
            Commands::Jenkins {
                url,
                view,
                username,
                token,
            } => {
                let username = username.as_ref().or(config.jenkins.username.as_ref());
                let token = token.as_ref().or(config.jenkins.token.as_ref());
                let credentials = Credentials::from_parts(
                    None,
                    username.map(String::as_str),
                    token.map(String::as_str),
                );
                let backend = connect_jenkins(&config, url.as_ref(), view.as_ref(), credentials)?;
                self.run(backend, &config).await
            }
            Commands::ClearCache { backend, url } => {
                let configured = match backend {
                    BackendKind::Concourse => config.concourse.base_url.as_ref(),
                    BackendKind::Jenkins => config.jenkins.base_url.as_ref(),
                };
                let section = backend.label().to_lowercase();
                let url = required_url(url.as_ref(), configured, &section)?;
                FileStore::clear(&providers::cache_slug(backend.label(), &url)?)?;
                Ok(())
            }
        }
    }
}
