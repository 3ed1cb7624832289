//! Typed access to the dashboard endpoints of the stats API.
//!
//! Every endpoint takes the same JSON body, `{"url": "...", "frequency": "..."}`,
//! and may answer with final data, a processing marker, or an error payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{
    ENDPOINT_CODE_FREQUENCY, ENDPOINT_COMMITS, ENDPOINT_CONTRIBUTORS, ENDPOINT_LANGUAGES, ENDPOINT_PULL_REQUESTS,
};
use crate::fetch::{FetchOptions, FetchResult, Fetcher, Subscription};

/// Errors raised before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Unknown panel '{0}'")]
    UnknownPanel(String),

    #[error("Unknown frequency '{0}'")]
    UnknownFrequency(String),
}

/// Bucket size for commit counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Day,
    #[default]
    Week,
    Month,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Day => "day",
            Frequency::Week => "week",
            Frequency::Month => "month",
        }
    }
}

impl FromStr for Frequency {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Frequency::Day),
            "week" | "weekly" => Ok(Frequency::Week),
            "month" | "monthly" => Ok(Frequency::Month),
            other => Err(ApiError::UnknownFrequency(other.to_string())),
        }
    }
}

/// Dashboard panels and the endpoint each one reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Commits,
    CodeFrequency,
    PullRequests,
    Contributors,
    Languages,
    /// Daily commits laid out as a contribution calendar
    Heatmap,
}

impl Panel {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Panel::Commits | Panel::Heatmap => ENDPOINT_COMMITS,
            Panel::CodeFrequency => ENDPOINT_CODE_FREQUENCY,
            Panel::PullRequests => ENDPOINT_PULL_REQUESTS,
            Panel::Contributors => ENDPOINT_CONTRIBUTORS,
            Panel::Languages => ENDPOINT_LANGUAGES,
        }
    }
}

impl FromStr for Panel {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "commits" => Ok(Panel::Commits),
            "code-frequency" => Ok(Panel::CodeFrequency),
            "pull-requests" | "prs" => Ok(Panel::PullRequests),
            "contributors" => Ok(Panel::Contributors),
            "languages" => Ok(Panel::Languages),
            "heatmap" => Ok(Panel::Heatmap),
            other => Err(ApiError::UnknownPanel(other.to_string())),
        }
    }
}

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/{owner}/{repo}` and its common variants
    /// (no scheme, `www.`, `.git` suffix, trailing path segments).
    pub fn parse(url: &str) -> Result<Self, ApiError> {
        let invalid = || ApiError::InvalidRepoUrl(url.to_string());

        let trimmed = url.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
        let path = without_www.strip_prefix("github.com/").ok_or_else(invalid)?;

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next().ok_or_else(invalid)?;
        let repo = segments.next().ok_or_else(invalid)?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        let valid = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(repo) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Canonical URL sent to the backend
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Request body shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRequest {
    pub url: String,
    pub frequency: Option<Frequency>,
}

impl RepoRequest {
    pub fn new(repo: &RepoRef) -> Self {
        Self {
            url: repo.url(),
            frequency: None,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn payload(&self) -> Value {
        match self.frequency {
            Some(frequency) => json!({ "url": self.url, "frequency": frequency.as_str() }),
            None => json!({ "url": self.url }),
        }
    }
}

/// `/api/commits` reply: commit counts keyed by `YYYY-MM-DD` bucket start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFrequency {
    #[serde(default)]
    pub commit_frequency: BTreeMap<String, u64>,
}

/// One week of `/api/code_frequency`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFrequencyPoint {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Code Additions")]
    pub additions: i64,
    /// Reported as a negative number by GitHub
    #[serde(rename = "Code Deletions")]
    pub deletions: i64,
}

/// `/api/pull_requests` reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCounts {
    pub open: u64,
    pub closed_unmerged: u64,
    pub merged: u64,
}

impl PullRequestCounts {
    pub fn total(&self) -> u64 {
        self.open + self.closed_unmerged + self.merged
    }
}

/// One entry of `/api/contributors`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// `/api/languages` reply: bytes of code per language
pub type LanguageBytes = BTreeMap<String, u64>;

/// Typed front-end over a shared [`Fetcher`]
#[derive(Clone)]
pub struct StatsApi {
    fetcher: Fetcher,
    options: FetchOptions,
}

impl StatsApi {
    pub fn new(fetcher: Fetcher, options: FetchOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub async fn commits(&self, repo: &RepoRef, frequency: Frequency) -> FetchResult<CommitFrequency> {
        let request = RepoRequest::new(repo).with_frequency(frequency);
        self.invoke(ENDPOINT_COMMITS, &request).await
    }

    pub async fn code_frequency(&self, repo: &RepoRef) -> FetchResult<Vec<CodeFrequencyPoint>> {
        self.invoke(ENDPOINT_CODE_FREQUENCY, &RepoRequest::new(repo)).await
    }

    pub async fn pull_requests(&self, repo: &RepoRef) -> FetchResult<PullRequestCounts> {
        self.invoke(ENDPOINT_PULL_REQUESTS, &RepoRequest::new(repo)).await
    }

    pub async fn contributors(&self, repo: &RepoRef) -> FetchResult<Vec<Contributor>> {
        self.invoke(ENDPOINT_CONTRIBUTORS, &RepoRequest::new(repo)).await
    }

    pub async fn languages(&self, repo: &RepoRef) -> FetchResult<LanguageBytes> {
        self.invoke(ENDPOINT_LANGUAGES, &RepoRequest::new(repo)).await
    }

    /// Polling subscription for one panel. The heatmap always reads daily commits.
    pub fn subscribe<T>(&self, panel: Panel, repo: &RepoRef, frequency: Frequency) -> Subscription<T>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        let request = match panel {
            Panel::Commits => RepoRequest::new(repo).with_frequency(frequency),
            Panel::Heatmap => RepoRequest::new(repo).with_frequency(Frequency::Day),
            _ => RepoRequest::new(repo),
        };
        self.fetcher
            .subscribe(panel.endpoint(), request.payload(), self.options.clone())
    }

    async fn invoke<T: DeserializeOwned>(&self, endpoint: &str, request: &RepoRequest) -> FetchResult<T> {
        self.fetcher.invoke(endpoint, &request.payload(), &self.options).await
    }
}
