use pretty_assertions::assert_eq;
use serde_json::json;

use repostats::api::*;

#[test]
fn test_repo_ref_parsing() {
    let repo = RepoRef::parse("https://github.com/rust-lang/cargo").unwrap();
    assert_eq!(repo.owner, "rust-lang");
    assert_eq!(repo.repo, "cargo");
    assert_eq!(repo.to_string(), "rust-lang/cargo");

    let variants = [
        "http://github.com/rust-lang/cargo",
        "github.com/rust-lang/cargo",
        "https://www.github.com/rust-lang/cargo/",
        "https://github.com/rust-lang/cargo.git",
        "https://github.com/rust-lang/cargo/tree/master/src",
    ];
    for url in variants {
        assert_eq!(RepoRef::parse(url).unwrap(), repo, "{}", url);
    }
}

#[test]
fn test_repo_ref_rejects_non_repo_urls() {
    for url in [
        "",
        "https://gitlab.com/a/b",
        "https://github.com/only-owner",
        "https://github.com/bad owner/repo",
    ] {
        assert_eq!(
            RepoRef::parse(url),
            Err(ApiError::InvalidRepoUrl(url.to_string())),
            "{}",
            url
        );
    }
}

#[test]
fn test_request_payload_shape() {
    let repo = RepoRef::parse("github.com/octocat/hello-world.git").unwrap();
    assert_eq!(
        RepoRequest::new(&repo).payload(),
        json!({"url": "https://github.com/octocat/hello-world"})
    );
    assert_eq!(
        RepoRequest::new(&repo).with_frequency(Frequency::Month).payload(),
        json!({"url": "https://github.com/octocat/hello-world", "frequency": "month"})
    );
}

#[test]
fn test_panel_and_frequency_parsing() {
    assert_eq!("commits".parse::<Panel>().unwrap(), Panel::Commits);
    assert_eq!("code_frequency".parse::<Panel>().unwrap(), Panel::CodeFrequency);
    assert_eq!("PRs".parse::<Panel>().unwrap(), Panel::PullRequests);
    assert_eq!("heatmap".parse::<Panel>().unwrap().endpoint(), "/api/commits");
    assert_eq!("languages".parse::<Panel>().unwrap().endpoint(), "/api/languages");
    assert!(matches!("stars".parse::<Panel>(), Err(ApiError::UnknownPanel(_))));

    assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Month);
    assert_eq!(Frequency::default(), Frequency::Week);
    assert!("hourly".parse::<Frequency>().is_err());
}

#[test]
fn test_response_models_decode_backend_json() {
    let points: Vec<CodeFrequencyPoint> =
        serde_json::from_value(json!([{"Date": "2024-01-07", "Code Additions": 40, "Code Deletions": -12}])).unwrap();
    assert_eq!(points[0].additions, 40);
    assert_eq!(points[0].deletions, -12);

    let contributors: Vec<Contributor> =
        serde_json::from_value(json!([{"login": "octocat", "contributions": 42}])).unwrap();
    assert_eq!(contributors[0].avatar_url, None);

    let commits: CommitFrequency = serde_json::from_value(json!({})).unwrap();
    assert!(commits.commit_frequency.is_empty());
}
