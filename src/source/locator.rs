use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::source::http::JsonFetcher;
use crate::source::traits::SourceError;

const GITHUB_BRANCHES: [&str; 2] = ["main", "master"];

/// Where a single `package.json` can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocator {
    /// A document URL on the registry itself, fetched as is.
    RegistryUrl(String),
    /// A raw.githubusercontent.com link to a package.json.
    RawManifest(String),
    GitHub { owner: String, repo: String },
    /// Bare package name; resolved through `{registry}/{name}/latest`.
    Package(String),
}

impl RepoLocator {
    pub fn parse(input: &str, registry: &str) -> Result<Self, SourceError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(invalid(input, "empty repository URL or package identifier"));
        }

        let registry = registry.trim_end_matches('/');
        if url.starts_with(&format!("{registry}/")) {
            return Ok(Self::RegistryUrl(url.to_string()));
        }

        if url.contains("raw.githubusercontent.com") && url.ends_with("/package.json") {
            return Ok(Self::RawManifest(url.to_string()));
        }

        if let Some(caps) = github_repo_re().captures(url) {
            return Ok(Self::GitHub {
                owner: caps["owner"].to_string(),
                repo: caps["repo"].to_string(),
            });
        }

        if let Some(name) = url.strip_prefix("npm:") {
            return Ok(Self::Package(name.to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Ok(Self::Package(url.to_string()));
        }

        Err(invalid(
            input,
            "expected a raw package.json URL, a GitHub repository URL, a registry URL or a package name",
        ))
    }

    /// URLs to try, in order, until one yields a JSON document.
    pub fn candidate_urls(&self, registry: &str) -> Vec<String> {
        match self {
            Self::RegistryUrl(url) | Self::RawManifest(url) => vec![url.clone()],
            Self::GitHub { owner, repo } => GITHUB_BRANCHES
                .iter()
                .map(|branch| {
                    format!("https://raw.githubusercontent.com/{owner}/{repo}/{branch}/package.json")
                })
                .collect(),
            Self::Package(name) => vec![format!(
                "{}/{}/latest",
                registry.trim_end_matches('/'),
                name
            )],
        }
    }
}

pub fn fetch_package_json(
    locator: &RepoLocator,
    fetcher: &dyn JsonFetcher,
    registry: &str,
) -> Result<Value, SourceError> {
    let mut last_error = None;
    for url in locator.candidate_urls(registry) {
        match fetcher.get_json(&url) {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(%url, error = %err, "package.json candidate failed");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| SourceError::NotFound(format!("{locator:?}"))))
}

fn github_repo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://github\.com/(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?(?:/|$)")
            .expect("github repository pattern is valid")
    })
}

fn invalid(input: &str, reason: &str) -> SourceError {
    SourceError::Unresolvable {
        name: input.to_string(),
        reason: reason.to_string(),
    }
}
