//! Thin GitHub REST adapter: one client implementing all five collaborator
//! traits. DTO structs per endpoint, one method per call, no policy — the
//! coordinator owns pacing and sequencing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use ownergate_engine::{CheckOutput, CoverageResult, DeclarationSource, Review, ReviewState};

use crate::config::GithubConfig;
use crate::providers::{
    CheckRunSink, MembershipResolver, NotificationSink, PrSnapshot, PrSnapshotProvider,
    ProviderError, RuleSource,
};

/// Name under which check-runs are recorded.
pub const CHECK_NAME: &str = "ownergate";

const USER_AGENT: &str = concat!("ownergate/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token,
        })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{tail}",
            self.api_base, self.owner, self.repo
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(transport)?;
        decode_json(response).await
    }

    async fn get_raw(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.raw")
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response)?;
        response.text().await.map_err(transport)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode_json(response).await
    }

    async fn patch_json(&self, url: &str, body: &serde_json::Value) -> Result<(), ProviderError> {
        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }
}

fn transport(error: reqwest::Error) -> ProviderError {
    ProviderError::Transport(error.to_string())
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(response.url().to_string()));
    }
    if !status.is_success() {
        return Err(ProviderError::Api(format!(
            "{status} from {}",
            response.url()
        )));
    }
    Ok(response)
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let response = check_status(response)?;
    response.json::<T>().await.map_err(transport)
}

// ── Wire DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct HeadDto {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    number: u64,
    state: String,
    user: UserDto,
    head: HeadDto,
}

#[derive(Debug, Deserialize)]
struct FileDto {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct ReviewDto {
    user: Option<UserDto>,
    state: String,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RequestedReviewersDto {
    users: Vec<UserDto>,
}

#[derive(Debug, Deserialize)]
struct TreeDto {
    tree: Vec<TreeEntryDto>,
}

#[derive(Debug, Deserialize)]
struct TreeEntryDto {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct CheckRunDto {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct CheckRunListDto {
    check_runs: Vec<CheckRunDto>,
}

fn review_state(wire: &str) -> ReviewState {
    match wire {
        "APPROVED" => ReviewState::Approve,
        "CHANGES_REQUESTED" => ReviewState::Reject,
        // COMMENTED, DISMISSED, and anything the API grows later.
        _ => ReviewState::Comment,
    }
}

#[async_trait]
impl RuleSource for GithubClient {
    async fn list_raw_declarations(&self) -> Result<Vec<DeclarationSource>, ProviderError> {
        let url = self.repo_url("git/trees/HEAD?recursive=1");
        let listing: TreeDto = self.get_json(&url).await?;

        let mut sources = Vec::new();
        for entry in listing.tree {
            if entry.kind != "blob" {
                continue;
            }
            let Some(dir) = entry.path.strip_suffix("OWNERS") else {
                continue;
            };
            if !dir.is_empty() && !dir.ends_with('/') {
                continue; // e.g. "CODEOWNERS", "docs/NOT_OWNERS"
            }
            let text = self
                .get_raw(&self.repo_url(&format!("contents/{}", entry.path)))
                .await?;
            sources.push(DeclarationSource::new(dir.trim_end_matches('/'), &text));
        }
        tracing::debug!(count = sources.len(), "listed OWNERS declarations");
        Ok(sources)
    }
}

#[async_trait]
impl MembershipResolver for GithubClient {
    async fn members_of(&self, team: &str) -> Result<BTreeSet<String>, ProviderError> {
        let (org, slug) = team
            .split_once('/')
            .ok_or_else(|| ProviderError::Api(format!("malformed team handle `{team}`")))?;
        let url = format!(
            "{}/orgs/{org}/teams/{slug}/members?per_page=100",
            self.api_base
        );
        let members: Vec<UserDto> = self.get_json(&url).await?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }
}

#[async_trait]
impl PrSnapshotProvider for GithubClient {
    async fn fetch(&self, number: u64) -> Result<PrSnapshot, ProviderError> {
        let pull: PullDto = self.get_json(&self.repo_url(&format!("pulls/{number}"))).await?;
        let files: Vec<FileDto> = self
            .get_json(&self.repo_url(&format!("pulls/{number}/files?per_page=100")))
            .await?;
        let reviews: Vec<ReviewDto> = self
            .get_json(&self.repo_url(&format!("pulls/{number}/reviews?per_page=100")))
            .await?;
        let requested: RequestedReviewersDto = self
            .get_json(&self.repo_url(&format!("pulls/{number}/requested_reviewers")))
            .await?;

        let reviews = reviews
            .into_iter()
            .filter_map(|r| {
                // Unsubmitted (pending) review drafts carry no timestamp.
                let submitted_at = r.submitted_at?;
                let user = r.user?;
                Some(Review {
                    reviewer: user.login,
                    submitted_at,
                    state: review_state(&r.state),
                })
            })
            .collect();

        Ok(PrSnapshot {
            number: pull.number,
            author: pull.user.login,
            head_sha: pull.head.sha,
            is_open: pull.state == "open",
            changed_files: files.into_iter().map(|f| f.filename).collect(),
            reviews,
            requested_reviewers: requested.users.into_iter().map(|u| u.login).collect(),
        })
    }
}

fn check_run_body(output: &CheckOutput) -> serde_json::Value {
    json!({
        "name": CHECK_NAME,
        "status": "completed",
        "conclusion": output.conclusion.as_str(),
        "output": {
            "title": output.title,
            "summary": output.summary,
        },
    })
}

#[async_trait]
impl CheckRunSink for GithubClient {
    async fn existing_check_run(&self, head_sha: &str) -> Result<Option<u64>, ProviderError> {
        let url = self.repo_url(&format!(
            "commits/{head_sha}/check-runs?check_name={CHECK_NAME}"
        ));
        let listing: CheckRunListDto = self.get_json(&url).await?;
        Ok(listing.check_runs.first().map(|run| run.id))
    }

    async fn create(&self, head_sha: &str, output: &CheckOutput) -> Result<u64, ProviderError> {
        let mut body = check_run_body(output);
        body["head_sha"] = json!(head_sha);
        let created: CheckRunDto = self.post_json(&self.repo_url("check-runs"), &body).await?;
        Ok(created.id)
    }

    async fn update(&self, id: u64, output: &CheckOutput) -> Result<(), ProviderError> {
        self.patch_json(&self.repo_url(&format!("check-runs/{id}")), &check_run_body(output))
            .await
    }
}

#[async_trait]
impl NotificationSink for GithubClient {
    /// Comment on the pull request when there is something actionable to
    /// say; a passing check speaks for itself.
    async fn notify(
        &self,
        snapshot: &PrSnapshot,
        coverage: &CoverageResult,
        output: &CheckOutput,
    ) -> Result<(), ProviderError> {
        if coverage.passing || output.suggested_reviewers.is_empty() {
            return Ok(());
        }
        let mentions = output
            .suggested_reviewers
            .iter()
            .map(|h| format!("@{h}"))
            .collect::<Vec<_>>()
            .join(" ");
        let body = format!("{}\ncc {mentions}", output.summary);
        let url = self.repo_url(&format!("issues/{}/comments", snapshot.number));
        let _: serde_json::Value = self.post_json(&url, &json!({ "body": body })).await?;
        Ok(())
    }
}
