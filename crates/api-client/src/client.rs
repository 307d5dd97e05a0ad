use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::debug;

use repodrive_core::{ContentEntry, EntryKind};

use crate::store::{ClientError, ContentStore, RawContent, RepoTarget, Result, check_write_size};

pub const USER_AGENT: &str = concat!("repodrive/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Raw-response headers copied through to the caller.
const PASSTHROUGH_HEADERS: &[&str] = &["content-type", "etag", "cache-control", "last-modified"];

/// [`ContentStore`] backed by the GitHub contents API and raw file host.
pub struct GitHubContentClient {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
}

impl GitHubContentClient {
    pub fn new(api_base: &str, raw_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, api_base, raw_base))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, api_base: &str, raw_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            raw_base: raw_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn raw_base(&self) -> &str {
        &self.raw_base
    }

    fn contents_url(&self, target: &RepoTarget, path: &str) -> String {
        let base = format!(
            "{}/repos/{}/{}/contents",
            self.api_base,
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo)
        );
        let encoded = encode_path(path);
        if encoded.is_empty() {
            base
        } else {
            format!("{base}/{encoded}")
        }
    }

    fn raw_url(&self, target: &RepoTarget, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base,
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo),
            urlencoding::encode(&target.branch),
            encode_path(path)
        )
    }

    fn request(&self, method: Method, url: &str, target: &RepoTarget) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", target.token))
            .header(ACCEPT, ACCEPT_HEADER)
    }

    async fn get_contents(&self, target: &RepoTarget, path: &str) -> Result<ListingBody> {
        let url = self.contents_url(target, path);
        debug!("GET contents {url}");
        let resp = self
            .request(Method::GET, &url, target)
            .query(&[("ref", target.branch.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }
        resp.json::<ListingBody>()
            .await
            .map_err(|e| ClientError::Decode(format!("contents of {path:?}: {e}")))
    }
}

#[async_trait]
impl ContentStore for GitHubContentClient {
    async fn list(&self, target: &RepoTarget, path: &str) -> Result<Vec<ContentEntry>> {
        Ok(match self.get_contents(target, path).await? {
            ListingBody::Many(items) => items.into_iter().map(ContentEntry::from).collect(),
            ListingBody::One(item) => vec![item.into()],
        })
    }

    async fn entry(&self, target: &RepoTarget, path: &str) -> Result<ContentEntry> {
        match self.get_contents(target, path).await? {
            ListingBody::One(item) => Ok(item.into()),
            ListingBody::Many(_) => Err(ClientError::Decode(format!(
                "{path:?} is a directory, expected a file"
            ))),
        }
    }

    async fn read_raw(&self, target: &RepoTarget, path: &str) -> Result<RawContent> {
        let url = self.raw_url(target, path);
        debug!("GET raw {url}");
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", target.token))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }

        let headers = PASSTHROUGH_HEADERS
            .iter()
            .filter_map(|name| {
                resp.headers()
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let bytes = resp.bytes().await?.to_vec();
        Ok(RawContent { bytes, headers })
    }

    async fn write(
        &self,
        target: &RepoTarget,
        path: &str,
        bytes: &[u8],
        message: &str,
    ) -> Result<()> {
        check_write_size(bytes.len())?;

        // Overwrites must name the blob they replace.
        let existing_sha = match self.entry(target, path).await {
            Ok(entry) => entry.sha,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };

        let body = PutBody {
            message,
            content: BASE64.encode(bytes),
            branch: &target.branch,
            sha: existing_sha,
            committer: target.committer.as_ref().map(|c| CommitterBody {
                name: &c.name,
                email: &c.email,
            }),
        };

        let url = self.contents_url(target, path);
        debug!("PUT contents {url} ({} bytes)", bytes.len());
        let resp = self
            .request(Method::PUT, &url, target)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }
        Ok(())
    }

    async fn delete(
        &self,
        target: &RepoTarget,
        path: &str,
        sha: &str,
        message: &str,
    ) -> Result<()> {
        let url = self.contents_url(target, path);
        debug!("DELETE contents {url}");
        let resp = self
            .request(Method::DELETE, &url, target)
            .json(&DeleteBody {
                message,
                sha,
                branch: &target.branch,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }
        Ok(())
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RemoteItem {
    name: String,
    path: String,
    #[serde(default)]
    sha: Option<String>,
    #[serde(rename = "type")]
    item_type: String,
}

impl From<RemoteItem> for ContentEntry {
    fn from(item: RemoteItem) -> Self {
        let kind = match item.item_type.as_str() {
            "dir" => EntryKind::Directory,
            _ => EntryKind::File,
        };
        ContentEntry {
            path: item.path,
            name: item.name,
            kind,
            sha: item.sha,
        }
    }
}

/// Directories come back as arrays, files as a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingBody {
    Many(Vec<RemoteItem>),
    One(RemoteItem),
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<CommitterBody<'a>>,
}

#[derive(Serialize)]
struct CommitterBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
    documentation_url: Option<String>,
    errors: Option<serde_json::Value>,
}

async fn remote_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ClientError::remote(status, describe_remote_error(status, &body))
}

/// Join the useful parts of a remote error body with ` - `.
fn describe_remote_error(status: u16, body: &str) -> String {
    let parsed: RemoteErrorBody = serde_json::from_str(body).unwrap_or_default();
    [
        parsed.message,
        parsed.documentation_url,
        parsed.errors.map(|e| e.to_string()),
        Some(format!("Status: {status}")),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" - ")
}

/// Percent-encode each segment, dropping empty ones.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
