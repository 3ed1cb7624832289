use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;

use repostats::api::{CodeFrequencyPoint, CommitFrequency, Contributor, LanguageBytes, PullRequestCounts};
use repostats::backend::HttpBackend;
use repostats::config::Config;
use repostats::constants::{STATE_LOADING, STATE_PROCESSING};
use repostats::logger::Logger;
use repostats::utils::datetime::format_time;
use repostats::{report, FetchOptions, FetchResult, Fetcher, Frequency, LoadingContext, Panel, RepoRef, StatsApi};

#[derive(Parser)]
#[command(name = "repostats")]
#[command(about = "GitHub repository statistics from the dashboard API", long_about = None)]
struct Cli {
    /// Repository URL, e.g. https://github.com/rust-lang/cargo
    #[arg(required_unless_present = "init_config")]
    repo_url: Option<String>,

    /// Panel to show: commits, code-frequency, pull-requests, contributors, languages, heatmap
    #[arg(default_value = "commits")]
    panel: Panel,

    /// Commit bucket size: day, week or month
    #[arg(short, long, default_value = "week")]
    frequency: Frequency,

    /// Read configuration from this file instead of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        let path = match cli.config {
            Some(path) => path,
            None => Config::get_default_config_path()?,
        };
        return Config::generate_default_config(path);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    Logger::init(&config.logging)?;

    let repo_url = cli.repo_url.context("A repository URL is required")?;
    let repo = RepoRef::parse(&repo_url)?;
    let base_url = config.resolve_base_url();
    log::info!("Using stats API at {}", base_url);

    let backend = HttpBackend::new(base_url).context("Failed to build HTTP client")?;
    let fetcher = Fetcher::new(Arc::new(backend), LoadingContext::new());
    let api = StatsApi::new(fetcher, FetchOptions::from(&config.fetch));

    println!(
        "{} · {} · {}",
        repo,
        cli.panel.endpoint(),
        format_time(chrono::Local::now(), config.display.time_with_seconds)
    );

    let display = &config.display;
    match cli.panel {
        Panel::Commits => {
            watch_panel(&api, cli.panel, &repo, cli.frequency, |data: &CommitFrequency| {
                report::render_commits(data, display)
            })
            .await
        }
        Panel::Heatmap => {
            watch_panel::<CommitFrequency, _>(&api, cli.panel, &repo, cli.frequency, report::render_heatmap).await
        }
        Panel::CodeFrequency => {
            watch_panel(&api, cli.panel, &repo, cli.frequency, |data: &Vec<CodeFrequencyPoint>| {
                report::render_code_frequency(data, display)
            })
            .await
        }
        Panel::PullRequests => {
            watch_panel(&api, cli.panel, &repo, cli.frequency, |data: &PullRequestCounts| {
                report::render_pull_requests(data)
            })
            .await
        }
        Panel::Contributors => {
            watch_panel(&api, cli.panel, &repo, cli.frequency, |data: &Vec<Contributor>| {
                report::render_contributors(data)
            })
            .await
        }
        Panel::Languages => {
            watch_panel::<LanguageBytes, _>(&api, cli.panel, &repo, cli.frequency, report::render_languages).await
        }
    }
}

/// Follow one panel's subscription until it settles or the user hits Ctrl-C
async fn watch_panel<T, F>(api: &StatsApi, panel: Panel, repo: &RepoRef, frequency: Frequency, render: F) -> Result<()>
where
    T: DeserializeOwned + Clone + Send + 'static,
    F: Fn(&T) -> String,
{
    let mut subscription = api.subscribe::<T>(panel, repo, frequency);
    subscription.start();

    loop {
        // `None` means the user hit Ctrl-C
        let update = tokio::select! {
            update = subscription.next_update() => Some(update),
            _ = tokio::signal::ctrl_c() => None,
        };

        match update {
            None => {
                subscription.cancel();
                log::info!("{}: cancelled by user", panel.endpoint());
                return Ok(());
            }
            Some(Some(FetchResult::Success(data))) => {
                println!("{}", render(&data));
                return Ok(());
            }
            // Reported once, by the caller of `main`
            Some(Some(FetchResult::Error(e))) => return Err(e.into()),
            Some(Some(pending)) => {
                if let Some(line) = status_line(&pending) {
                    eprintln!("{}", line);
                }
            }
            Some(None) => return Ok(()),
        }
    }
}

/// Progress line for a non-terminal state
fn status_line<T>(result: &FetchResult<T>) -> Option<String> {
    match result {
        FetchResult::Loading => Some(STATE_LOADING.to_string()),
        FetchResult::Processing(message) => Some(format!("{}: {}", STATE_PROCESSING, message)),
        FetchResult::Idle | FetchResult::Success(_) | FetchResult::Error(_) => None,
    }
}
